//! Context - Identity pool and render coordination.
//!
//! One [`Context`] per component tree. It owns:
//!
//! - the identity pool: component state and component instances by key
//! - the layout solver and optional stylesheet
//! - suspension, observers and the one-shot layout animator
//!
//! Everything here is single-threaded. The context remembers the thread it
//! was created on and panics when driven from any other.
//!
//! # Pool lifetime
//!
//! Entries are created on first access and live until a pass finishes
//! without rendering their key. The root component calls
//! [`Context::flush_obsolete_states`] with every explicit key of the tree it
//! just rendered; everything else is evicted.

use std::any::{type_name, Any};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use super::component::{AnyComponent, Canvas, Component, ComponentHandle, RenderOptions, State};
use super::node::Node;
use super::reconciler::{ReconcileReport, Reconciler};
use super::thread::UiThread;
use crate::layout::{LayoutAnimator, LayoutSolver, TaffySolver};
use crate::style::StyleSheet;
use crate::types::Size;

// =============================================================================
// Configuration
// =============================================================================

/// Tunables for a [`Context`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContextConfig {
    /// Skip the second measure pass when the first one already returned the
    /// available size.
    pub skip_redundant_measure: bool,
    /// Passes slower than this are logged at debug level.
    pub slow_pass_threshold: Duration,
    /// Animator for every pass. [`Context::set_layout_animator`] overrides it
    /// for a single pass.
    pub layout_animator: Option<LayoutAnimator>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            skip_redundant_measure: false,
            slow_pass_threshold: Duration::from_millis(16),
            layout_animator: None,
        }
    }
}

// =============================================================================
// Observers
// =============================================================================

/// Render lifecycle hooks. Held weakly; dropping the observer unregisters it.
pub trait RenderObserver {
    /// A root is about to render.
    fn will_render(&self, component: Option<&str>) {
        let _ = component;
    }

    /// A root finished a pass.
    fn did_render(&self, component: Option<&str>, report: &ReconcileReport) {
        let _ = (component, report);
    }

    /// Keys evicted from the pool after a pass. Not called when empty.
    fn did_flush(&self, evicted: &[String]) {
        let _ = evicted;
    }
}

// =============================================================================
// Identity pool
// =============================================================================

struct PooledState {
    value: Box<dyn Any>,
    type_name: &'static str,
    describe: fn(&dyn Any) -> String,
}

impl PooledState {
    fn new<S: State>(value: S) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<S>(),
            describe: |value| {
                value
                    .downcast_ref::<S>()
                    .map_or_else(String::new, |state| format!("{state:?}"))
            },
        }
    }
}

/// What a flush removed.
pub(crate) struct Eviction {
    pub(crate) keys: Vec<String>,
    /// Dropped by the caller once the pool borrow is released.
    pub(crate) components: Vec<Rc<dyn AnyComponent>>,
}

/// Keyed storage for component state and component instances.
///
/// A key holds at most one state and one component. Asking for a key with a
/// different type than the one stored is a programming error and panics.
#[derive(Default)]
pub struct IdentityPool {
    states: HashMap<String, PooledState>,
    components: HashMap<String, Rc<dyn AnyComponent>>,
}

impl IdentityPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// State under `key`, created with `S::default()` on first access.
    pub fn state<S: State>(&mut self, key: &str) -> &S {
        let entry = self
            .states
            .entry(key.to_string())
            .or_insert_with(|| PooledState::new(S::default()));

        match entry.value.downcast_ref::<S>() {
            Some(state) => state,
            None => panic!(
                "state for key `{key}` is a {}, requested as {}",
                entry.type_name,
                type_name::<S>()
            ),
        }
    }

    /// Overwrite the state under `key`.
    pub fn store<S: State>(&mut self, key: &str, state: S) {
        if let Some(existing) = self.states.get(key)
            && !existing.value.is::<S>()
        {
            panic!(
                "state for key `{key}` is a {}, stored as {}",
                existing.type_name,
                type_name::<S>()
            );
        }
        self.states.insert(key.to_string(), PooledState::new(state));
    }

    /// Component under `key`, built with `construct` on first access.
    pub fn component<T: AnyComponent>(&mut self, key: &str, construct: impl FnOnce() -> Rc<T>) -> Rc<T> {
        if let Some(existing) = self.find_component(key) {
            return existing;
        }

        let component = construct();
        self.components.insert(key.to_string(), component.clone());
        component
    }

    /// Component already pooled under `key`, if any.
    pub fn find_component<T: AnyComponent>(&self, key: &str) -> Option<Rc<T>> {
        let existing = self.components.get(key)?;
        let found = existing.type_name();
        match existing.clone().into_any().downcast::<T>() {
            Ok(component) => Some(component),
            Err(_) => panic!(
                "component for key `{key}` is a {found}, requested as {}",
                type_name::<T>()
            ),
        }
    }

    pub fn contains_state(&self, key: &str) -> bool {
        self.states.contains_key(key)
    }

    pub fn contains_component(&self, key: &str) -> bool {
        self.components.contains_key(key)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Debug description of the state under `key`.
    pub fn describe_state(&self, key: &str) -> Option<String> {
        self.states.get(key).map(|entry| (entry.describe)(entry.value.as_ref()))
    }

    /// Drop every state and component whose key is not in `valid`.
    pub(crate) fn flush_obsolete_states(&mut self, valid: &HashSet<String>) -> Eviction {
        let mut keys = Vec::new();

        self.states.retain(|key, _| {
            let keep = valid.contains(key);
            if !keep {
                keys.push(key.clone());
            }
            keep
        });

        let mut components = Vec::new();
        let obsolete: Vec<String> = self
            .components
            .keys()
            .filter(|key| !valid.contains(*key))
            .cloned()
            .collect();
        for key in obsolete {
            if let Some(component) = self.components.remove(&key) {
                components.push(component);
            }
            keys.push(key);
        }

        keys.sort();
        keys.dedup();
        Eviction { keys, components }
    }

    pub(crate) fn drain(&mut self) -> Vec<Rc<dyn AnyComponent>> {
        self.states.clear();
        self.components.drain().map(|(_, component)| component).collect()
    }
}

impl fmt::Debug for IdentityPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut states: Vec<(&str, String)> = self
            .states
            .iter()
            .map(|(key, entry)| (key.as_str(), (entry.describe)(entry.value.as_ref())))
            .collect();
        states.sort();
        let mut components: Vec<(&str, &str)> = self
            .components
            .iter()
            .map(|(key, component)| (key.as_str(), component.type_name()))
            .collect();
        components.sort();

        f.debug_struct("IdentityPool")
            .field("states", &states)
            .field("components", &components)
            .finish()
    }
}

// =============================================================================
// Context
// =============================================================================

/// Shared state for one component tree.
pub struct Context {
    thread: UiThread,
    config: ContextConfig,
    pool: RefCell<IdentityPool>,
    solver: RefCell<Box<dyn LayoutSolver>>,
    stylesheet: RefCell<Option<Rc<dyn StyleSheet>>>,
    observers: RefCell<Vec<Weak<dyn RenderObserver>>>,
    suspended: Cell<bool>,
    deferred: RefCell<Vec<Weak<dyn AnyComponent>>>,
    layout_animator: Cell<Option<LayoutAnimator>>,
    last_report: Cell<Option<ReconcileReport>>,
    disposed: Cell<bool>,
}

impl Context {
    /// Context bound to the calling thread, with the Taffy solver.
    pub fn new() -> Rc<Self> {
        Self::with_config(ContextConfig::default())
    }

    pub fn with_config(config: ContextConfig) -> Rc<Self> {
        Self::with_solver(config, TaffySolver::new())
    }

    pub fn with_solver(config: ContextConfig, solver: impl LayoutSolver + 'static) -> Rc<Self> {
        Rc::new(Self {
            thread: UiThread::current(),
            config,
            pool: RefCell::new(IdentityPool::new()),
            solver: RefCell::new(Box::new(solver)),
            stylesheet: RefCell::new(None),
            observers: RefCell::new(Vec::new()),
            suspended: Cell::new(false),
            deferred: RefCell::new(Vec::new()),
            layout_animator: Cell::new(None),
            last_report: Cell::new(None),
            disposed: Cell::new(false),
        })
    }

    pub fn thread(&self) -> UiThread {
        self.thread
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    // =========================================================================
    // Pool
    // =========================================================================

    /// Copy of the state under `key`, created on first access.
    pub fn state<S: State>(&self, key: &str) -> S {
        self.thread.assert_current("state");
        self.pool.borrow_mut().state::<S>(key).clone()
    }

    /// Overwrite the state under `key`. Does not render.
    pub fn store<S: State>(&self, key: &str, state: S) {
        self.thread.assert_current("store");
        self.pool.borrow_mut().store(key, state);
    }

    /// Pooled component under `key`, built with `construct` on first access.
    pub fn component<C: Component>(
        self: &Rc<Self>,
        key: &str,
        construct: impl FnOnce() -> C,
    ) -> ComponentHandle<C> {
        self.thread.assert_current("component");
        let existing = self.pool.borrow().find_component(key);
        if let Some(cell) = existing {
            return ComponentHandle(cell);
        }

        // Constructors may read the context, so the pool stays unborrowed here.
        let fresh = ComponentHandle::new(construct(), Some(key.to_string()), self).0;
        let cell = self.pool.borrow_mut().component(key, || fresh);
        ComponentHandle(cell)
    }

    /// Unpooled, stateless component.
    pub fn transient_component<C: Component>(self: &Rc<Self>, component: C) -> ComponentHandle<C> {
        self.thread.assert_current("transient_component");
        ComponentHandle::new(component, None, self)
    }

    pub fn has_state(&self, key: &str) -> bool {
        self.pool.borrow().contains_state(key)
    }

    pub fn has_component(&self, key: &str) -> bool {
        self.pool.borrow().contains_component(key)
    }

    pub fn state_count(&self) -> usize {
        self.pool.borrow().state_count()
    }

    pub fn component_count(&self) -> usize {
        self.pool.borrow().component_count()
    }

    pub fn describe_state(&self, key: &str) -> Option<String> {
        self.pool.borrow().describe_state(key)
    }

    /// Evict every pool entry whose key is not in `valid`.
    ///
    /// Returns the evicted keys, sorted. Observers are told through
    /// `did_flush` by the pass that triggered the flush.
    pub fn flush_obsolete_states(&self, valid: &HashSet<String>) -> Vec<String> {
        self.thread.assert_current("flush_obsolete_states");
        let eviction = self.pool.borrow_mut().flush_obsolete_states(valid);
        drop(eviction.components);

        if !eviction.keys.is_empty() {
            log::debug!("evicted {} pool entries: {:?}", eviction.keys.len(), eviction.keys);
        }
        eviction.keys
    }

    // =========================================================================
    // Rendering control
    // =========================================================================

    /// Hold back root renders until [`resume_rendering`](Self::resume_rendering).
    pub fn suspend_rendering(&self) {
        self.thread.assert_current("suspend_rendering");
        self.suspended.set(true);
    }

    /// Lift the suspension and run one render per root that asked for one.
    pub fn resume_rendering(&self) {
        self.thread.assert_current("resume_rendering");
        self.suspended.set(false);

        let deferred = std::mem::take(&mut *self.deferred.borrow_mut());
        for component in deferred.iter().filter_map(Weak::upgrade) {
            component.resume_render();
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.get()
    }

    pub(crate) fn defer(&self, component: Weak<dyn AnyComponent>) {
        self.deferred.borrow_mut().push(component);
    }

    /// Animate the frame changes of the next pass only.
    pub fn set_layout_animator(&self, animator: LayoutAnimator) {
        self.layout_animator.set(Some(animator));
    }

    pub fn set_stylesheet(&self, stylesheet: Rc<dyn StyleSheet>) {
        *self.stylesheet.borrow_mut() = Some(stylesheet);
    }

    pub fn stylesheet(&self) -> Option<Rc<dyn StyleSheet>> {
        self.stylesheet.borrow().clone()
    }

    pub fn add_observer<O: RenderObserver + 'static>(&self, observer: &Rc<O>) {
        let weak = Rc::downgrade(observer);
        let weak: Weak<dyn RenderObserver> = weak;
        self.observers.borrow_mut().push(weak);
    }

    /// Report of the most recent pass.
    pub fn last_report(&self) -> Option<ReconcileReport> {
        self.last_report.get()
    }

    /// Drop the pool, observers and pending renders. Components still
    /// holding this context panic on their next render request.
    pub fn dispose(&self) {
        self.thread.assert_current("dispose");
        self.disposed.set(true);
        let components = self.pool.borrow_mut().drain();
        drop(components);
        self.observers.borrow_mut().clear();
        self.deferred.borrow_mut().clear();
        log::debug!("context disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    // =========================================================================
    // Pass plumbing
    // =========================================================================

    fn live_observers(&self) -> Vec<Rc<dyn RenderObserver>> {
        let mut observers = self.observers.borrow_mut();
        observers.retain(|observer| observer.strong_count() > 0);
        observers.iter().filter_map(Weak::upgrade).collect()
    }

    pub(crate) fn notify_will_render(&self, component: Option<&str>) {
        for observer in self.live_observers() {
            observer.will_render(component);
        }
    }

    /// Diff, configure and lay out `root` under `canvas`.
    ///
    /// The view tree is borrowed per phase so node callbacks may inspect it.
    pub(crate) fn run_pass(
        &self,
        canvas: &Canvas,
        root: &mut Node,
        available: Size,
        options: RenderOptions,
    ) -> ReconcileReport {
        let animator = self
            .layout_animator
            .take()
            .or(self.config.layout_animator)
            .or_else(|| {
                options
                    .contains(RenderOptions::ANIMATE)
                    .then(LayoutAnimator::default)
            });
        let mut reconciler = Reconciler::new(options)
            .with_stylesheet(self.stylesheet())
            .with_animator(animator)
            .skip_redundant_measure(self.config.skip_redundant_measure);

        {
            let mut tree = canvas.tree().borrow_mut();
            reconciler.diff(&mut tree, root, canvas.view());
        }
        reconciler.will_layout(root);
        {
            let mut tree = canvas.tree().borrow_mut();
            reconciler.configure(&mut tree, root, available);
            let mut solver = self.solver.borrow_mut();
            reconciler.layout(&mut tree, &mut **solver, root, available);
        }
        reconciler.did_layout(root);

        reconciler.finish()
    }

    pub(crate) fn finish_pass(&self, component: Option<&str>, report: ReconcileReport, evicted: &[String]) {
        if report.elapsed > self.config.slow_pass_threshold {
            log::debug!(
                "slow render of {}: {:?} ({} created, {} reused, {} removed)",
                component.unwrap_or("<transient>"),
                report.elapsed,
                report.created,
                report.reused,
                report.removed
            );
        }
        self.last_report.set(Some(report));

        for observer in self.live_observers() {
            observer.did_render(component, &report);
            if !evicted.is_empty() {
                observer.did_flush(evicted);
            }
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("thread", &self.thread)
            .field("config", &self.config)
            .field("pool", &*self.pool.borrow())
            .field("suspended", &self.suspended.get())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Counter {
        count: i32,
    }

    fn setup() -> Rc<Context> {
        Context::new()
    }

    fn keys(list: &[&str]) -> HashSet<String> {
        list.iter().map(|key| key.to_string()).collect()
    }

    #[test]
    fn test_state_fetch_or_construct() {
        let context = setup();
        assert!(!context.has_state("a"));

        let state: Counter = context.state("a");
        assert_eq!(state, Counter::default());
        assert!(context.has_state("a"));
    }

    #[test]
    fn test_store_overwrites() {
        let context = setup();
        context.store("a", Counter { count: 3 });
        context.store("a", Counter { count: 4 });
        assert_eq!(context.state::<Counter>("a").count, 4);
        assert_eq!(context.state_count(), 1);
    }

    #[test]
    #[should_panic(expected = "requested as")]
    fn test_state_type_mismatch_panics() {
        let context = setup();
        context.store("a", Counter { count: 1 });
        let _: String = context.state("a");
    }

    #[test]
    #[should_panic(expected = "stored as")]
    fn test_store_type_mismatch_panics() {
        let context = setup();
        context.store("a", Counter { count: 1 });
        context.store("a", 5_u32);
    }

    #[test]
    fn test_flush_evicts_unlisted_keys() {
        let context = setup();
        context.store("keep", Counter { count: 1 });
        context.store("drop", Counter { count: 2 });

        let evicted = context.flush_obsolete_states(&keys(&["keep"]));

        assert_eq!(evicted, vec!["drop".to_string()]);
        assert!(context.has_state("keep"));
        assert!(!context.has_state("drop"));
    }

    #[test]
    fn test_flush_is_idempotent() {
        let context = setup();
        context.store("a", Counter::default());
        context.store("b", Counter::default());

        let valid = keys(&["a"]);
        context.flush_obsolete_states(&valid);
        let second = context.flush_obsolete_states(&valid);

        assert!(second.is_empty());
        assert_eq!(context.state_count(), 1);
    }

    #[test]
    fn test_describe_state_uses_debug() {
        let context = setup();
        context.store("a", Counter { count: 7 });
        assert_eq!(context.describe_state("a").as_deref(), Some("Counter { count: 7 }"));
        assert_eq!(context.describe_state("missing"), None);
    }

    #[test]
    fn test_suspend_flag() {
        let context = setup();
        context.suspend_rendering();
        assert!(context.is_suspended());
        context.resume_rendering();
        assert!(!context.is_suspended());
    }

    #[test]
    fn test_layout_animator_is_one_shot() {
        let context = setup();
        context.set_layout_animator(LayoutAnimator::default());
        assert!(context.layout_animator.take().is_some());
        assert!(context.layout_animator.take().is_none());
    }

    struct Panel {
        seen: usize,
    }

    impl Component for Panel {
        type State = ();
        type Props = ();

        fn render(&self, _cx: &crate::engine::RenderCx<'_, Self>) -> Node {
            Node::new(crate::primitives::Container::default)
        }
    }

    #[test]
    fn test_constructor_may_read_context() {
        let context = setup();
        context.component("first", || Panel { seen: 0 });

        let reader = context.clone();
        let second = context.component("second", move || Panel {
            seen: reader.component_count(),
        });

        assert_eq!(second.component().seen, 1);
        assert_eq!(context.component_count(), 2);
        assert!(second.ptr_eq(&context.component("second", || Panel { seen: 99 })));
    }

    #[test]
    #[should_panic(expected = "requested as")]
    fn test_component_type_mismatch_panics() {
        struct Other;

        impl Component for Other {
            type State = ();
            type Props = ();

            fn render(&self, _cx: &crate::engine::RenderCx<'_, Self>) -> Node {
                Node::new(crate::primitives::Container::default)
            }
        }

        let context = setup();
        context.component("a", || Panel { seen: 0 });
        context.component("a", || Other);
    }

    #[test]
    fn test_observers_are_held_weakly() {
        struct Quiet;
        impl RenderObserver for Quiet {}

        let context = setup();
        let observer = Rc::new(Quiet);
        context.add_observer(&observer);
        assert_eq!(context.observers.borrow().len(), 1);
        assert!(context.observers.borrow()[0].upgrade().is_some());

        drop(observer);
        assert!(context.observers.borrow()[0].upgrade().is_none());
    }

    #[test]
    fn test_dispose_clears_pool() {
        let context = setup();
        context.store("a", Counter::default());
        context.dispose();
        assert!(context.is_disposed());
        assert_eq!(context.state_count(), 0);
    }
}
