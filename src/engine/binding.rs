//! Property bindings.
//!
//! A [`Property`] names one settable field of a backing view type. A
//! configure closure turns properties into bindings ("set `text` to
//! `Odd: 1`"). Each view remembers the bindings applied in the previous pass
//! together with the value each property had before it was first bound, so a
//! binding that disappears can be rolled back.
//!
//! # Example
//!
//! ```
//! use render_tree::engine::Property;
//! use render_tree::host::NativeView;
//!
//! #[derive(Default)]
//! struct Badge {
//!     count: u32,
//! }
//!
//! impl NativeView for Badge {}
//!
//! impl Badge {
//!     pub const COUNT: Property<Badge, u32> =
//!         Property::new("count", |badge| badge.count, |badge, count| badge.count = count);
//! }
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use super::key::hash_one;
use crate::host::NativeView;

// =============================================================================
// Property descriptors
// =============================================================================

/// Stable identity of a property: hash of the view type and property name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyId(u64);

impl PropertyId {
    pub fn of<V: 'static>(name: &str) -> Self {
        Self(hash_one(&(std::any::type_name::<V>(), name)))
    }
}

/// Getter/setter pair for one property of `V`.
pub struct Property<V, T> {
    name: &'static str,
    get: fn(&V) -> T,
    set: fn(&mut V, T),
}

impl<V, T> Property<V, T> {
    pub const fn new(name: &'static str, get: fn(&V) -> T, set: fn(&mut V, T)) -> Self {
        Self { name, get, set }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self, view: &V) -> T {
        (self.get)(view)
    }

    pub fn set(&self, view: &mut V, value: T) {
        (self.set)(view, value)
    }
}

impl<V: 'static, T> Property<V, T> {
    pub fn id(&self) -> PropertyId {
        PropertyId::of::<V>(self.name)
    }
}

impl<V, T> Clone for Property<V, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V, T> Copy for Property<V, T> {}

impl<V, T> fmt::Debug for Property<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("view", &std::any::type_name::<V>())
            .field("name", &self.name)
            .finish()
    }
}

// =============================================================================
// Transitions
// =============================================================================

/// Timing curve for animated changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Curve {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
}

/// Optional animation attached to a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub duration: Duration,
    pub curve: Curve,
}

impl Transition {
    pub const fn new(duration: Duration, curve: Curve) -> Self {
        Self { duration, curve }
    }
}

// =============================================================================
// Bindings
// =============================================================================

/// Result of applying or restoring one binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingOutcome {
    /// The native property was written.
    Applied,
    /// Equal value already in place, nothing written.
    Skipped,
    /// The view is not of the binding's target type.
    Mismatch,
}

/// Values properties held before their first binding.
pub type InitialValues = HashMap<PropertyId, Box<dyn Any>>;

/// Type-erased binding, as stored in a view's render context.
pub trait AnyBinding {
    fn id(&self) -> PropertyId;

    fn name(&self) -> &'static str;

    /// Write the bound value, caching the pre-binding value on first use.
    fn apply(&self, view: &mut dyn NativeView, initial: &mut InitialValues) -> BindingOutcome;

    /// Put back the cached pre-binding value.
    fn restore(&self, view: &mut dyn NativeView, initial: &mut InitialValues) -> BindingOutcome;
}

struct Binding<V, T> {
    property: Property<V, T>,
    value: T,
    eq: Option<fn(&T, &T) -> bool>,
    transition: Option<Transition>,
}

impl<V: NativeView, T: Clone + 'static> Binding<V, T> {
    fn target<'v>(&self, view: &'v mut dyn NativeView) -> Option<&'v mut V> {
        let actual = view.type_name();
        let target = view.downcast_mut::<V>();
        if target.is_none() {
            log::warn!(
                "binding `{}` expects a {}, found {}; skipped",
                self.property.name,
                std::any::type_name::<V>(),
                actual
            );
        }
        target
    }
}

impl<V: NativeView, T: Clone + 'static> AnyBinding for Binding<V, T> {
    fn id(&self) -> PropertyId {
        self.property.id()
    }

    fn name(&self) -> &'static str {
        self.property.name
    }

    fn apply(&self, view: &mut dyn NativeView, initial: &mut InitialValues) -> BindingOutcome {
        let Some(target) = self.target(view) else {
            return BindingOutcome::Mismatch;
        };

        let current = self.property.get(target);
        if let Some(eq) = self.eq {
            if eq(&current, &self.value) {
                initial
                    .entry(self.id())
                    .or_insert_with(|| Box::new(current) as Box<dyn Any>);
                return BindingOutcome::Skipped;
            }
        }
        initial
            .entry(self.id())
            .or_insert_with(|| Box::new(current) as Box<dyn Any>);

        if let Some(transition) = &self.transition {
            target.will_transition(self.property.name, transition);
        }
        self.property.set(target, self.value.clone());
        BindingOutcome::Applied
    }

    fn restore(&self, view: &mut dyn NativeView, initial: &mut InitialValues) -> BindingOutcome {
        let Some(target) = self.target(view) else {
            return BindingOutcome::Mismatch;
        };

        let Some(original) = initial.remove(&self.id()) else {
            return BindingOutcome::Skipped;
        };
        let Ok(original) = original.downcast::<T>() else {
            return BindingOutcome::Mismatch;
        };

        if let Some(eq) = self.eq {
            if eq(&self.property.get(target), &*original) {
                return BindingOutcome::Skipped;
            }
        }
        self.property.set(target, *original);
        BindingOutcome::Applied
    }
}

/// Bindings registered by one configure call, keyed by property.
///
/// Binding the same property twice keeps the last value.
#[derive(Default)]
pub struct BindingSet {
    bindings: Vec<Box<dyn AnyBinding>>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an equatable value; re-application is skipped when the view
    /// already holds an equal value.
    pub fn set<V, T>(&mut self, property: Property<V, T>, value: T)
    where
        V: NativeView,
        T: Clone + PartialEq + 'static,
    {
        self.push(Binding {
            property,
            value,
            eq: Some(<T as PartialEq>::eq),
            transition: None,
        });
    }

    /// Bind a value with no equality (handlers, opaque resources). Applied
    /// on every pass.
    pub fn set_unchecked<V, T>(&mut self, property: Property<V, T>, value: T)
    where
        V: NativeView,
        T: Clone + 'static,
    {
        self.push(Binding {
            property,
            value,
            eq: None,
            transition: None,
        });
    }

    /// Bind an equatable value and animate the change.
    pub fn animate<V, T>(&mut self, property: Property<V, T>, value: T, transition: Transition)
    where
        V: NativeView,
        T: Clone + PartialEq + 'static,
    {
        self.push(Binding {
            property,
            value,
            eq: Some(<T as PartialEq>::eq),
            transition: Some(transition),
        });
    }

    fn push(&mut self, binding: impl AnyBinding + 'static) {
        let id = binding.id();
        self.bindings.retain(|existing| existing.id() != id);
        self.bindings.push(Box::new(binding));
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn contains(&self, id: PropertyId) -> bool {
        self.bindings.iter().any(|binding| binding.id() == id)
    }
}

// =============================================================================
// Render context
// =============================================================================

/// Counts from committing one view's bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BindingStats {
    pub applied: usize,
    pub restored: usize,
    pub skipped: usize,
    pub mismatched: usize,
}

impl BindingStats {
    fn record(&mut self, outcome: BindingOutcome, restoring: bool) {
        match (outcome, restoring) {
            (BindingOutcome::Applied, false) => self.applied += 1,
            (BindingOutcome::Applied, true) => self.restored += 1,
            (BindingOutcome::Skipped, _) => self.skipped += 1,
            (BindingOutcome::Mismatch, _) => self.mismatched += 1,
        }
    }
}

impl std::ops::AddAssign for BindingStats {
    fn add_assign(&mut self, other: Self) {
        self.applied += other.applied;
        self.restored += other.restored;
        self.skipped += other.skipped;
        self.mismatched += other.mismatched;
    }
}

/// Per-view record of applied bindings and original property values.
#[derive(Default)]
pub struct RenderContext {
    applied: HashMap<PropertyId, Box<dyn AnyBinding>>,
    initial: InitialValues,
}

impl RenderContext {
    /// Diff `next` against the bindings from the previous pass.
    ///
    /// Properties bound before but not now are restored first, then every
    /// binding in `next` is applied (subject to the equal-value skip).
    pub fn commit(&mut self, view: &mut dyn NativeView, next: BindingSet) -> BindingStats {
        let mut stats = BindingStats::default();

        let stale: Vec<PropertyId> = self
            .applied
            .keys()
            .copied()
            .filter(|&id| !next.contains(id))
            .collect();
        for id in stale {
            if let Some(binding) = self.applied.remove(&id) {
                stats.record(binding.restore(view, &mut self.initial), true);
            }
        }

        let mut applied = HashMap::with_capacity(next.len());
        for binding in next.bindings {
            let outcome = binding.apply(view, &mut self.initial);
            stats.record(outcome, false);
            if outcome != BindingOutcome::Mismatch {
                applied.insert(binding.id(), binding);
            }
        }
        self.applied = applied;

        stats
    }

    pub fn is_bound(&self, id: PropertyId) -> bool {
        self.applied.contains_key(&id)
    }

    /// Number of properties currently bound.
    pub fn bound_count(&self) -> usize {
        self.applied.len()
    }

    /// Forget everything without touching the view.
    pub fn clear(&mut self) {
        self.applied.clear();
        self.initial.clear();
    }
}
