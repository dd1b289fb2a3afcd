//! Node - Per-pass description of one backing view.
//!
//! A node is built fresh by every render call and dropped once the pass that
//! consumed it is over. What persists is the native view the node was bound
//! to, which the next pass may hand to a node with the same reuse category.
//!
//! # Example
//!
//! ```
//! use render_tree::engine::{Node, Property};
//! use render_tree::host::NativeView;
//!
//! #[derive(Default)]
//! struct Caption {
//!     text: String,
//! }
//!
//! impl NativeView for Caption {}
//!
//! impl Caption {
//!     const TEXT: Property<Caption, String> =
//!         Property::new("text", |c| c.text.clone(), |c, text| c.text = text);
//! }
//!
//! let node = Node::configured(Caption::default, |cfg| {
//!     cfg.set(Caption::TEXT, "Hello");
//!     cfg.layout().flex_grow = 1.0;
//! })
//! .with_key("title");
//! assert_eq!(node.key().instance_key(), "title");
//! ```

use std::cell::Cell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use super::binding::{BindingSet, Property, Transition};
use super::component::AnyComponent;
use super::key::{disambiguate, Key, ReuseTag};
use crate::host::{NativeView, ViewId};
use crate::layout::FlexStyle;
use crate::style::StyleSheet;
use crate::types::Size;

type CreateFn = Box<dyn Fn() -> Box<dyn NativeView>>;
type ConfigureFn = Box<dyn Fn(ConfigureInput<'_>)>;
type Callback = Box<dyn Fn(ViewId)>;

// =============================================================================
// View refs
// =============================================================================

/// Shared slot that receives the view a node was bound to.
///
/// Updated at the end of every pass in which the node is rendered.
#[derive(Debug, Clone, Default)]
pub struct ViewRef(Rc<Cell<Option<ViewId>>>);

impl ViewRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<ViewId> {
        self.0.get()
    }

    pub(crate) fn set(&self, view: ViewId) {
        self.0.set(Some(view));
    }
}

// =============================================================================
// Configure scope
// =============================================================================

/// Untyped arguments for a configure closure.
pub(crate) struct ConfigureInput<'a> {
    pub(crate) view: &'a dyn NativeView,
    pub(crate) id: ViewId,
    pub(crate) layout: &'a mut FlexStyle,
    pub(crate) available: Size,
    pub(crate) bindings: &'a mut BindingSet,
    pub(crate) style: Option<&'a dyn StyleSheet>,
}

/// What a configure closure sees: the view (read-only), its layout handle,
/// the available size and the binding registry.
pub struct Config<'a, V> {
    view: &'a V,
    id: ViewId,
    layout: &'a mut FlexStyle,
    available: Size,
    bindings: &'a mut BindingSet,
    style: Option<&'a dyn StyleSheet>,
}

impl<V: NativeView> Config<'_, V> {
    /// Current state of the view, before this pass's bindings.
    pub fn view(&self) -> &V {
        self.view
    }

    pub fn view_id(&self) -> ViewId {
        self.id
    }

    /// Layout handle, reset to defaults at the start of every pass.
    pub fn layout(&mut self) -> &mut FlexStyle {
        &mut *self.layout
    }

    /// Size offered by the canvas. Axes may be infinite.
    pub fn available_size(&self) -> Size {
        self.available
    }

    pub fn style(&self) -> Option<&dyn StyleSheet> {
        self.style
    }

    /// Bind `property` to `value`.
    pub fn set<T>(&mut self, property: Property<V, T>, value: impl Into<T>) -> &mut Self
    where
        T: Clone + PartialEq + 'static,
    {
        self.bindings.set(property, value.into());
        self
    }

    /// Bind a value that cannot be compared (handlers and the like).
    pub fn set_unchecked<T>(&mut self, property: Property<V, T>, value: T) -> &mut Self
    where
        T: Clone + 'static,
    {
        self.bindings.set_unchecked(property, value);
        self
    }

    /// Bind `property` and animate the change.
    pub fn animate<T>(
        &mut self,
        property: Property<V, T>,
        value: impl Into<T>,
        transition: Transition,
    ) -> &mut Self
    where
        T: Clone + PartialEq + 'static,
    {
        self.bindings.animate(property, value.into(), transition);
        self
    }
}

// =============================================================================
// Node
// =============================================================================

/// Immutable-per-pass descriptor of one view and its children.
pub struct Node {
    key: Key,
    explicit_key: bool,
    index: usize,
    children: Vec<Node>,
    create: CreateFn,
    configure: Option<ConfigureFn>,
    on_mount: Option<Callback>,
    will_layout: Option<Callback>,
    did_layout: Option<Callback>,
    reset_before_reuse: bool,
    view_ref: Option<ViewRef>,
    component: Option<Weak<dyn AnyComponent>>,
    view: Option<ViewId>,
}

impl Node {
    /// Node backed by views made by `create`. The reuse category defaults to
    /// the view's type name.
    pub fn new<V: NativeView>(create: impl Fn() -> V + 'static) -> Self {
        Self {
            key: Key::new(std::any::type_name::<V>(), ""),
            explicit_key: false,
            index: 0,
            children: Vec::new(),
            create: Box::new(move || Box::new(create()) as Box<dyn NativeView>),
            configure: None,
            on_mount: None,
            will_layout: None,
            did_layout: None,
            reset_before_reuse: false,
            view_ref: None,
            component: None,
            view: None,
        }
    }

    /// Shorthand for `Node::new(create).configure(configure)`.
    pub fn configured<V: NativeView>(
        create: impl Fn() -> V + 'static,
        configure: impl Fn(&mut Config<'_, V>) + 'static,
    ) -> Self {
        Self::new(create).configure(configure)
    }

    // =========================================================================
    // Builders
    // =========================================================================

    /// Explicit instance key.
    ///
    /// Unkeyed siblings are keyed by position, so reordering them hands each
    /// view to whichever node lands in its slot. Give reorderable children
    /// stable keys.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key.set_instance_key(key);
        self.explicit_key = true;
        self
    }

    /// Override the reuse category. Nodes with different categories never
    /// share views even if their view types match.
    pub fn with_reuse_category(mut self, category: impl Into<String>) -> Self {
        self.key.set_reuse_category(category);
        self
    }

    /// Register the configure closure.
    ///
    /// If the bound view turns out not to be a `V` the closure is skipped
    /// with a warning.
    pub fn configure<V: NativeView>(mut self, f: impl Fn(&mut Config<'_, V>) + 'static) -> Self {
        self.configure = Some(Box::new(move |input: ConfigureInput<'_>| {
            let Some(view) = input.view.downcast_ref::<V>() else {
                log::warn!(
                    "configure for {:?} expects a {}, found {}; skipped",
                    input.id,
                    std::any::type_name::<V>(),
                    input.view.type_name()
                );
                return;
            };
            let mut config = Config {
                view,
                id: input.id,
                layout: input.layout,
                available: input.available,
                bindings: input.bindings,
                style: input.style,
            };
            f(&mut config);
        }));
        self
    }

    /// Append a child.
    pub fn with_child(mut self, child: Node) -> Self {
        self.attach(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        for child in children {
            self.attach(child);
        }
        self
    }

    /// Called once, after the pass that created the node's view.
    pub fn on_mount(mut self, f: impl Fn(ViewId) + 'static) -> Self {
        self.on_mount = Some(Box::new(f));
        self
    }

    /// Called before the node's view is configured.
    pub fn will_layout(mut self, f: impl Fn(ViewId) + 'static) -> Self {
        self.will_layout = Some(Box::new(f));
        self
    }

    /// Called after frames have been written.
    pub fn did_layout(mut self, f: impl Fn(ViewId) + 'static) -> Self {
        self.did_layout = Some(Box::new(f));
        self
    }

    /// Ask a reused view to reset itself before it is configured.
    pub fn reset_before_reuse(mut self) -> Self {
        self.reset_before_reuse = true;
        self
    }

    /// Publish the bound view into `slot` after each pass.
    pub fn bind_view(mut self, slot: &ViewRef) -> Self {
        self.view_ref = Some(slot.clone());
        self
    }

    fn attach(&mut self, mut child: Node) {
        child.index = self.children.len();

        if !child.explicit_key {
            let ordinal = self
                .children
                .iter()
                .filter(|sibling| {
                    !sibling.explicit_key
                        && sibling.key.reuse_category() == child.key.reuse_category()
                })
                .count();
            child.key.set_instance_key(ordinal.to_string());
        }

        let original = child.key.clone();
        if disambiguate(&mut child.key, self.children.iter().map(|sibling| &sibling.key)) {
            if child.explicit_key {
                log::warn!("duplicate sibling key {original}; renamed to {}", child.key);
            } else {
                log::debug!("auto key {original} collided; renamed to {}", child.key);
            }
        }

        self.children.push(child);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn has_explicit_key(&self) -> bool {
        self.explicit_key
    }

    pub fn reuse_tag(&self) -> ReuseTag {
        self.key.reuse_tag()
    }

    /// Position among siblings.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// View bound by the last reconciliation of this node.
    pub fn view(&self) -> Option<ViewId> {
        self.view
    }

    /// Component whose render produced this node, if it is still alive.
    pub fn associated_component(&self) -> Option<Rc<dyn AnyComponent>> {
        self.component.as_ref().and_then(Weak::upgrade)
    }

    /// Explicit instance keys reachable from this node.
    pub fn collect_keys(&self, keys: &mut HashSet<String>) {
        if self.explicit_key {
            keys.insert(self.key.instance_key().to_string());
        }
        for child in &self.children {
            child.collect_keys(keys);
        }
    }

    // =========================================================================
    // Engine hooks
    // =========================================================================

    pub(crate) fn create_view(&self) -> Box<dyn NativeView> {
        (self.create)()
    }

    pub(crate) fn run_configure(&self, input: ConfigureInput<'_>) {
        if let Some(configure) = &self.configure {
            configure(input);
        }
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    pub(crate) fn bind(&mut self, view: ViewId) {
        self.view = Some(view);
    }

    pub(crate) fn resets_before_reuse(&self) -> bool {
        self.reset_before_reuse
    }

    pub(crate) fn notify_will_layout(&self, view: ViewId) {
        if let Some(f) = &self.will_layout {
            f(view);
        }
    }

    pub(crate) fn notify_did_layout(&self, view: ViewId) {
        if let Some(f) = &self.did_layout {
            f(view);
        }
    }

    pub(crate) fn notify_mount(&self, view: ViewId) {
        if let Some(f) = &self.on_mount {
            f(view);
        }
    }

    pub(crate) fn view_ref(&self) -> Option<&ViewRef> {
        self.view_ref.as_ref()
    }

    /// Root node of a keyed component takes the component's key.
    pub(crate) fn assign_component_key(&mut self, key: &str) {
        if self.explicit_key && self.key.instance_key() != key {
            log::warn!(
                "root node key `{}` differs from component key `{key}`; using the component key",
                self.key.instance_key()
            );
        }
        self.key.set_instance_key(key);
        self.explicit_key = true;
    }

    pub(crate) fn associate(&mut self, component: Weak<dyn AnyComponent>) {
        self.component = Some(component);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key.to_string())
            .field("index", &self.index)
            .field("view", &self.view)
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Row;

    impl NativeView for Row {}

    #[derive(Default)]
    struct Cell;

    impl NativeView for Cell {}

    #[test]
    fn test_reuse_category_defaults_to_view_type() {
        let node = Node::new(Row::default);
        assert_eq!(node.key().reuse_category(), std::any::type_name::<Row>());
        assert_eq!(node.reuse_tag(), ReuseTag::of(std::any::type_name::<Row>()));

        let custom = Node::new(Row::default).with_reuse_category("header");
        assert_ne!(custom.reuse_tag(), node.reuse_tag());
    }

    #[test]
    fn test_children_get_indices_and_auto_keys() {
        let node = Node::new(Row::default).with_children([
            Node::new(Cell::default),
            Node::new(Row::default),
            Node::new(Cell::default),
        ]);

        let indices: Vec<usize> = node.children().iter().map(Node::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);

        let keys: Vec<&str> = node.children().iter().map(|c| c.key().instance_key()).collect();
        assert_eq!(keys, vec!["0", "0", "1"]);
    }

    #[test]
    fn test_duplicate_explicit_keys_are_disambiguated() {
        let node = Node::new(Row::default)
            .with_child(Node::new(Cell::default).with_key("item"))
            .with_child(Node::new(Cell::default).with_key("item"))
            .with_child(Node::new(Cell::default).with_key("item"));

        let keys: Vec<&str> = node.children().iter().map(|c| c.key().instance_key()).collect();
        assert_eq!(keys, vec!["item", "item#1", "item#2"]);
    }

    #[test]
    fn test_auto_key_colliding_with_explicit_key() {
        let node = Node::new(Row::default)
            .with_child(Node::new(Cell::default).with_key("0"))
            .with_child(Node::new(Cell::default));

        assert_eq!(node.children()[1].key().instance_key(), "0#1");
    }

    #[test]
    fn test_collect_keys_only_explicit() {
        let node = Node::new(Row::default).with_key("root").with_children([
            Node::new(Cell::default).with_key("cell-0"),
            Node::new(Cell::default),
        ]);

        let mut keys = HashSet::new();
        node.collect_keys(&mut keys);
        assert_eq!(keys, HashSet::from(["root".to_string(), "cell-0".to_string()]));
    }

    #[test]
    fn test_component_key_overrides_root_key() {
        let mut node = Node::new(Row::default).with_key("inner");
        node.assign_component_key("outer");
        assert_eq!(node.key().instance_key(), "outer");
        assert!(node.has_explicit_key());
    }

    #[test]
    fn test_view_ref_starts_empty() {
        let slot = ViewRef::new();
        let node = Node::new(Row::default).bind_view(&slot);
        assert!(node.view_ref().is_some());
        assert_eq!(slot.get(), None);
    }
}
