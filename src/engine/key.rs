//! Node identity.
//!
//! A [`Key`] pairs a reuse category (normally the backing view's type name)
//! with an instance key. A view is reused by a node only when its
//! [`ReuseTag`] and the instance key it was last bound to both match the
//! node's key, so siblings of one category never trade views. Instance keys
//! also identify pooled state and components.

use std::fmt;
use std::hash::{Hash, Hasher};

use ahash::AHasher;

/// Identity of a node among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    reuse_category: String,
    instance_key: String,
}

impl Key {
    pub fn new(reuse_category: impl Into<String>, instance_key: impl Into<String>) -> Self {
        Self {
            reuse_category: reuse_category.into(),
            instance_key: instance_key.into(),
        }
    }

    pub fn reuse_category(&self) -> &str {
        &self.reuse_category
    }

    pub fn instance_key(&self) -> &str {
        &self.instance_key
    }

    pub fn reuse_tag(&self) -> ReuseTag {
        ReuseTag::of(&self.reuse_category)
    }

    pub(crate) fn set_instance_key(&mut self, instance_key: impl Into<String>) {
        self.instance_key = instance_key.into();
    }

    pub(crate) fn set_reuse_category(&mut self, reuse_category: impl Into<String>) {
        self.reuse_category = reuse_category.into();
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.reuse_category, self.instance_key)
    }
}

/// Hash of a reuse category, stored on views to decide reuse eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReuseTag(u64);

impl ReuseTag {
    pub fn of(reuse_category: &str) -> Self {
        Self(hash_one(reuse_category))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Fixed-key hash, stable across runs of the same build.
pub(crate) fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = AHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Make `key` distinct from every key in `siblings`.
///
/// Colliding keys get an enumeration suffix (`#1`, `#2`, ...) in the order
/// they are attached, so the same child list always resolves the same way.
/// Returns true if the key had to be rewritten.
pub(crate) fn disambiguate<'a>(
    key: &mut Key,
    siblings: impl Iterator<Item = &'a Key> + Clone,
) -> bool {
    if !siblings.clone().any(|sibling| sibling == key) {
        return false;
    }

    let base = key.instance_key.clone();
    let mut ordinal = 1usize;
    loop {
        let candidate = Key::new(key.reuse_category.clone(), format!("{base}#{ordinal}"));
        if !siblings.clone().any(|sibling| *sibling == candidate) {
            *key = candidate;
            return true;
        }
        ordinal += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_equality_uses_both_fields() {
        assert_eq!(Key::new("Label", "title"), Key::new("Label", "title"));
        assert_ne!(Key::new("Label", "title"), Key::new("Button", "title"));
        assert_ne!(Key::new("Label", "title"), Key::new("Label", "subtitle"));
    }

    #[test]
    fn test_reuse_tag_depends_on_category_only() {
        let a = Key::new("Label", "a");
        let b = Key::new("Label", "b");
        assert_eq!(a.reuse_tag(), b.reuse_tag());
        assert_ne!(a.reuse_tag(), Key::new("Button", "a").reuse_tag());
        assert_eq!(ReuseTag::of("Label"), a.reuse_tag());
    }

    #[test]
    fn test_display() {
        assert_eq!(Key::new("Label", "cell-3").to_string(), "Label_cell-3");
    }

    #[test]
    fn test_disambiguate_in_enumeration_order() {
        let mut siblings = vec![Key::new("Cell", "x")];

        let mut second = Key::new("Cell", "x");
        assert!(disambiguate(&mut second, siblings.iter()));
        assert_eq!(second.instance_key(), "x#1");
        siblings.push(second);

        let mut third = Key::new("Cell", "x");
        assert!(disambiguate(&mut third, siblings.iter()));
        assert_eq!(third.instance_key(), "x#2");

        let mut unrelated = Key::new("Label", "x");
        assert!(!disambiguate(&mut unrelated, siblings.iter()));
        assert_eq!(unrelated.instance_key(), "x");
    }
}
