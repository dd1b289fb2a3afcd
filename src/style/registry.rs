//! In-memory stylesheet.

use std::collections::HashMap;

use super::{StyleSheet, StyleValue};

/// Rules stored by `(namespace, name)`.
///
/// Hosts that resolve styles elsewhere implement [`StyleSheet`] directly;
/// this registry covers the common case of a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    rules: HashMap<(String, String), StyleValue>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or replace a rule.
    pub fn define(
        &mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<StyleValue>,
    ) {
        self.rules
            .insert((namespace.into(), name.into()), value.into());
    }

    pub fn remove(&mut self, namespace: &str, name: &str) -> Option<StyleValue> {
        self.rules
            .remove(&(namespace.to_string(), name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names defined in `namespace`, sorted.
    pub fn names(&self, namespace: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .rules
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, name)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl StyleSheet for StyleRegistry {
    fn value(&self, namespace: &str, name: &str) -> Option<StyleValue> {
        self.rules
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_replace_remove() {
        let mut registry = StyleRegistry::new();
        registry.define("Spacing", "gutter", 8.0);
        registry.define("Spacing", "gutter", 12.0);
        registry.define("Spacing", "inset", 4.0);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.value("Spacing", "gutter"), Some(StyleValue::Number(12.0)));
        assert_eq!(registry.names("Spacing"), vec!["gutter", "inset"]);

        assert!(registry.remove("Spacing", "gutter").is_some());
        assert_eq!(registry.value("Spacing", "gutter"), None);
    }
}
