//! Components - Stateful producers of node trees.
//!
//! A component renders a fresh [`Node`] tree from its props and its pooled
//! state. Keyed components live in the [`Context`]'s identity pool and keep
//! their state across renders; unkeyed (transient) components are rebuilt by
//! every parent render and have no state.
//!
//! # Architecture
//!
//! ```text
//! set_state ─▶ store(key) ─▶ request_render ─▶ parent? ──yes──▶ parent.request_render
//!                                                 │
//!                                                 no (root)
//!                                                 ▼
//!                      render ─▶ diff ─▶ configure ─▶ layout ─▶ flush pool
//! ```
//!
//! Only roots own a [`Canvas`]. Child renders always bubble up, so every pass
//! reconciles the whole tree under one canvas.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use render_tree::engine::{Canvas, CanvasOptions, Component, Context, Node, RenderCx, RenderOptions};
//! use render_tree::host::ViewTree;
//! use render_tree::primitives::{Container, Label};
//! use render_tree::types::Size;
//!
//! struct Greeting;
//!
//! impl Component for Greeting {
//!     type State = ();
//!     type Props = String;
//!
//!     fn render(&self, cx: &RenderCx<'_, Self>) -> Node {
//!         let text = format!("Hello, {}", cx.props());
//!         Node::new(Container::default)
//!             .with_child(Node::configured(Label::default, move |cfg| {
//!                 cfg.set(Label::TEXT, text.clone());
//!             }))
//!     }
//! }
//!
//! let tree = Rc::new(RefCell::new(ViewTree::new()));
//! let canvas = tree.borrow_mut().create(Container::default());
//!
//! let context = Context::new();
//! let greeting = context.component("greeting", || Greeting);
//! greeting.set_props("world".to_string());
//! greeting.set_canvas(Canvas::new(tree.clone(), canvas).with_options(CanvasOptions::empty()).with_size(Size::new(320.0, 200.0)));
//! greeting.request_render(RenderOptions::empty());
//!
//! assert_eq!(context.last_report().unwrap().created, 2);
//! ```

use std::any::Any;
use std::cell::{Cell, Ref, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Instant;

use bitflags::bitflags;

use super::context::Context;
use super::node::Node;
use crate::host::{ViewId, ViewTree};
use crate::style::StyleSheet;
use crate::types::Size;

// =============================================================================
// Traits
// =============================================================================

/// Pooled component state. `Debug` doubles as the inspection format.
pub trait State: Default + Clone + fmt::Debug + 'static {}

impl<T: Default + Clone + fmt::Debug + 'static> State for T {}

/// Caller-supplied component input, replaced on every parent render.
pub trait Props: Default + fmt::Debug + 'static {}

impl<T: Default + fmt::Debug + 'static> Props for T {}

/// A render function plus its state and props types.
pub trait Component: Sized + 'static {
    type State: State;
    type Props: Props;

    fn render(&self, cx: &RenderCx<'_, Self>) -> Node;
}

/// Type-erased component, as held by the pool and by parent links.
pub trait AnyComponent: 'static {
    fn key(&self) -> Option<&str>;

    /// Name of the component type.
    fn type_name(&self) -> &'static str;

    /// Debug description with props and state.
    fn describe(&self) -> String;

    fn parent(&self) -> Option<Rc<dyn AnyComponent>>;

    /// View bound to this component's root node in the last pass.
    fn root_view(&self) -> Option<ViewId>;

    /// Re-render the tree this component belongs to.
    fn request_render(self: Rc<Self>, options: RenderOptions);

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;

    #[doc(hidden)]
    fn bind_root_view(&self, view: ViewId);

    #[doc(hidden)]
    fn resume_render(self: Rc<Self>);
}

// =============================================================================
// Options
// =============================================================================

bitflags! {
    /// Per-request render options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RenderOptions: u8 {
        /// Keep the view hierarchy as is and only re-apply configuration.
        const SUPPRESS_DIFF = 0b0000_0001;
        /// Animate frame changes.
        const ANIMATE = 0b0000_0010;
        /// Skip `on_mount`/`will_layout`/`did_layout` node callbacks.
        const SUPPRESS_CALLBACKS = 0b0000_0100;
    }
}

bitflags! {
    /// How a root component derives its available size.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CanvasOptions: u8 {
        /// Use the canvas view's frame as the available size.
        const USE_BOUNDS_AS_CANVAS_SIZE = 0b0000_0001;
        /// Re-render when the available size changes.
        const RENDER_ON_CANVAS_SIZE_CHANGE = 0b0000_0010;
        /// Unbounded width.
        const FLEXIBLE_WIDTH = 0b0000_0100;
        /// Unbounded height.
        const FLEXIBLE_HEIGHT = 0b0000_1000;
    }
}

impl Default for CanvasOptions {
    fn default() -> Self {
        Self::USE_BOUNDS_AS_CANVAS_SIZE | Self::RENDER_ON_CANVAS_SIZE_CHANGE | Self::FLEXIBLE_HEIGHT
    }
}

// =============================================================================
// Canvas
// =============================================================================

/// The host view a root component renders into.
#[derive(Clone)]
pub struct Canvas {
    tree: Rc<RefCell<ViewTree>>,
    view: ViewId,
    options: CanvasOptions,
    size: Size,
}

impl Canvas {
    pub fn new(tree: Rc<RefCell<ViewTree>>, view: ViewId) -> Self {
        Self {
            tree,
            view,
            options: CanvasOptions::default(),
            size: Size::ZERO,
        }
    }

    pub fn with_options(mut self, options: CanvasOptions) -> Self {
        self.options = options;
        self
    }

    /// Explicit size, used unless `USE_BOUNDS_AS_CANVAS_SIZE` is set.
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn tree(&self) -> &Rc<RefCell<ViewTree>> {
        &self.tree
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn options(&self) -> CanvasOptions {
        self.options
    }

    /// Size offered to the root node.
    pub fn available_size(&self) -> Size {
        let mut size = if self.options.contains(CanvasOptions::USE_BOUNDS_AS_CANVAS_SIZE) {
            self.tree
                .borrow()
                .frame(self.view)
                .map_or(Size::ZERO, |frame| frame.size)
        } else {
            self.size
        };
        if self.options.contains(CanvasOptions::FLEXIBLE_WIDTH) {
            size.width = f32::INFINITY;
        }
        if self.options.contains(CanvasOptions::FLEXIBLE_HEIGHT) {
            size.height = f32::INFINITY;
        }
        size
    }
}

// =============================================================================
// Component cell
// =============================================================================

pub(crate) struct ComponentCell<C: Component> {
    component: C,
    key: Option<String>,
    props: RefCell<C::Props>,
    parent: RefCell<Option<Weak<dyn AnyComponent>>>,
    context: Weak<Context>,
    canvas: RefCell<Option<Canvas>>,
    root_view: Cell<Option<ViewId>>,
    rendered_size: Cell<Option<Size>>,
    /// A pass is running for this root.
    rendering: Cell<bool>,
    /// Requests that arrived mid-pass.
    queued: Cell<Option<RenderOptions>>,
    /// Requests that arrived while the context was suspended.
    deferred: Cell<Option<RenderOptions>>,
}

impl<C: Component> ComponentCell<C> {
    fn context(&self) -> Rc<Context> {
        match self.context.upgrade() {
            Some(context) if !context.is_disposed() => context,
            _ => panic!(
                "{} has no context; it was dropped or disposed",
                std::any::type_name::<C>()
            ),
        }
    }
}

impl<C: Component> AnyComponent for ComponentCell<C> {
    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<C>()
    }

    fn describe(&self) -> String {
        let state = match (&self.key, self.context.upgrade()) {
            (Some(key), Some(context)) => context.describe_state(key),
            _ => None,
        };
        format!(
            "{}(key: {:?}, props: {:?}, state: {})",
            self.type_name(),
            self.key,
            self.props.borrow(),
            state.as_deref().unwrap_or("-")
        )
    }

    fn parent(&self) -> Option<Rc<dyn AnyComponent>> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    fn root_view(&self) -> Option<ViewId> {
        self.root_view.get()
    }

    fn request_render(self: Rc<Self>, options: RenderOptions) {
        let context = self.context();
        context.thread().assert_current("request_render");

        if let Some(parent) = self.parent() {
            parent.request_render(options);
            return;
        }

        if context.is_suspended() {
            let merged = self.deferred.get().map_or(options, |pending| pending | options);
            if self.deferred.replace(Some(merged)).is_none() {
                let weak = Rc::downgrade(&self);
                let weak: Weak<dyn AnyComponent> = weak;
                context.defer(weak);
            }
            return;
        }

        if self.rendering.get() {
            let merged = self.queued.get().map_or(options, |pending| pending | options);
            self.queued.set(Some(merged));
            return;
        }

        let handle = ComponentHandle(self.clone());
        let mut options = options;
        loop {
            self.rendering.set(true);
            handle.render_root(&context, options);
            self.rendering.set(false);

            match self.queued.take() {
                Some(next) => options = next,
                None => break,
            }
        }
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn bind_root_view(&self, view: ViewId) {
        self.root_view.set(Some(view));
    }

    fn resume_render(self: Rc<Self>) {
        if let Some(options) = self.deferred.take() {
            self.request_render(options);
        }
    }
}

// =============================================================================
// Handles
// =============================================================================

/// Shared handle to a component instance.
pub struct ComponentHandle<C: Component>(pub(crate) Rc<ComponentCell<C>>);

impl<C: Component> Clone for ComponentHandle<C> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<C: Component> fmt::Debug for ComponentHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.describe())
    }
}

impl<C: Component> ComponentHandle<C> {
    pub(crate) fn new(component: C, key: Option<String>, context: &Rc<Context>) -> Self {
        Self(Rc::new(ComponentCell {
            component,
            key,
            props: RefCell::new(C::Props::default()),
            parent: RefCell::new(None),
            context: Rc::downgrade(context),
            canvas: RefCell::new(None),
            root_view: Cell::new(None),
            rendered_size: Cell::new(None),
            rendering: Cell::new(false),
            queued: Cell::new(None),
            deferred: Cell::new(None),
        }))
    }

    pub fn component(&self) -> &C {
        &self.0.component
    }

    pub fn key(&self) -> Option<&str> {
        self.0.key.as_deref()
    }

    /// Unkeyed: not pooled, no state.
    pub fn is_transient(&self) -> bool {
        self.0.key.is_none()
    }

    pub fn context(&self) -> Option<Rc<Context>> {
        self.0.context.upgrade()
    }

    pub fn props(&self) -> Ref<'_, C::Props> {
        self.0.props.borrow()
    }

    /// Replace the props. Does not render.
    pub fn set_props(&self, props: C::Props) {
        *self.0.props.borrow_mut() = props;
    }

    /// Current state; the default for transient components.
    pub fn state(&self) -> C::State {
        match &self.0.key {
            Some(key) => self.0.context().state::<C::State>(key),
            None => C::State::default(),
        }
    }

    /// Mutate the state and re-render.
    pub fn set_state(&self, update: impl FnOnce(&mut C::State)) {
        self.set_state_with(RenderOptions::empty(), update);
    }

    pub fn set_state_with(&self, options: RenderOptions, update: impl FnOnce(&mut C::State)) {
        let context = self.0.context();
        context.thread().assert_current("set_state");

        let Some(key) = &self.0.key else {
            log::warn!(
                "{} is transient and has no state to update",
                std::any::type_name::<C>()
            );
            return;
        };

        let mut next = context.state::<C::State>(key);
        update(&mut next);
        context.store(key, next);
        self.request_render(options);
    }

    pub fn request_render(&self, options: RenderOptions) {
        self.0.clone().request_render(options);
    }

    /// Make this component a root rendering into `canvas`.
    pub fn set_canvas(&self, canvas: Canvas) {
        *self.0.canvas.borrow_mut() = Some(canvas);
    }

    pub fn canvas(&self) -> Option<Canvas> {
        self.0.canvas.borrow().clone()
    }

    /// Change the explicit canvas size; see [`canvas_did_resize`](Self::canvas_did_resize).
    pub fn set_canvas_size(&self, size: Size) {
        if let Some(canvas) = self.0.canvas.borrow_mut().as_mut() {
            canvas.size = size;
        }
        self.canvas_did_resize();
    }

    /// Host notification that the canvas bounds may have changed. Renders
    /// if `RENDER_ON_CANVAS_SIZE_CHANGE` is set and the available size
    /// differs from the last pass.
    pub fn canvas_did_resize(&self) {
        let Some(canvas) = self.canvas() else { return };
        if !canvas
            .options()
            .contains(CanvasOptions::RENDER_ON_CANVAS_SIZE_CHANGE)
        {
            return;
        }
        if self.0.rendered_size.get() != Some(canvas.available_size()) {
            self.request_render(RenderOptions::empty());
        }
    }

    pub fn parent(&self) -> Option<Rc<dyn AnyComponent>> {
        self.0.parent()
    }

    pub fn root_view(&self) -> Option<ViewId> {
        self.0.root_view.get()
    }

    pub fn describe(&self) -> String {
        self.0.describe()
    }

    pub fn downgrade(&self) -> WeakHandle<C> {
        WeakHandle(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn as_dyn_weak(&self) -> Weak<dyn AnyComponent> {
        let weak = Rc::downgrade(&self.0);
        let weak: Weak<dyn AnyComponent> = weak;
        weak
    }

    fn set_parent<P: Component>(&self, parent: &ComponentHandle<P>) {
        *self.0.parent.borrow_mut() = Some(parent.as_dyn_weak());
    }

    /// Run the render function and tag the result with this component.
    fn render_node(&self, context: &Rc<Context>) -> Node {
        let cx = RenderCx {
            handle: self,
            context,
        };
        let mut node = self.0.component.render(&cx);
        if let Some(key) = &self.0.key {
            node.assign_component_key(key);
        }
        node.associate(self.as_dyn_weak());
        node
    }

    /// One full pass at the root.
    fn render_root(&self, context: &Rc<Context>, options: RenderOptions) {
        let Some(canvas) = self.canvas() else {
            panic!(
                "{} requested a render without a canvas view",
                std::any::type_name::<C>()
            );
        };

        let key = self.0.key.as_deref();
        context.notify_will_render(key);
        let started = Instant::now();

        let mut root = self.render_node(context);
        let available = canvas.available_size();
        self.0.rendered_size.set(Some(available));

        let report = context.run_pass(&canvas, &mut root, available, options);

        let mut keys = HashSet::new();
        root.collect_keys(&mut keys);
        drop(root);
        let evicted = context.flush_obsolete_states(&keys);

        context.finish_pass(key, report.with_elapsed(started.elapsed()), &evicted);
    }
}

/// Non-owning handle, for capture in view handlers.
///
/// Handlers live inside views, views live in the tree, and the tree is
/// reachable from the root component; a strong handle there would form a
/// cycle.
pub struct WeakHandle<C: Component>(Weak<ComponentCell<C>>);

impl<C: Component> Clone for WeakHandle<C> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<C: Component> WeakHandle<C> {
    pub fn upgrade(&self) -> Option<ComponentHandle<C>> {
        self.0.upgrade().map(ComponentHandle)
    }

    /// No-op once the component is gone.
    pub fn set_state(&self, update: impl FnOnce(&mut C::State)) {
        if let Some(handle) = self.upgrade() {
            handle.set_state(update);
        }
    }

    pub fn request_render(&self, options: RenderOptions) {
        if let Some(handle) = self.upgrade() {
            handle.request_render(options);
        }
    }
}

// =============================================================================
// Render scope
// =============================================================================

/// What a render function can reach.
pub struct RenderCx<'a, C: Component> {
    handle: &'a ComponentHandle<C>,
    context: &'a Rc<Context>,
}

impl<'a, C: Component> RenderCx<'a, C> {
    pub fn state(&self) -> C::State {
        self.handle.state()
    }

    pub fn props(&self) -> Ref<'a, C::Props> {
        self.handle.0.props.borrow()
    }

    pub fn key(&self) -> Option<&'a str> {
        self.handle.0.key.as_deref()
    }

    pub fn handle(&self) -> ComponentHandle<C> {
        self.handle.clone()
    }

    /// Weak handle for event handlers.
    pub fn weak(&self) -> WeakHandle<C> {
        self.handle.downgrade()
    }

    pub fn context(&self) -> &'a Rc<Context> {
        self.context
    }

    pub fn stylesheet(&self) -> Option<Rc<dyn StyleSheet>> {
        self.context.stylesheet()
    }

    /// Render a pooled child component.
    ///
    /// The child is fetched (or built with `construct`) from the pool under
    /// `key`, given `props`, and rendered in place.
    pub fn child<D: Component>(
        &self,
        key: &str,
        construct: impl FnOnce() -> D,
        props: D::Props,
    ) -> Node {
        let child = self.context.component::<D>(key, construct);
        if std::ptr::addr_eq(Rc::as_ptr(&child.0), Rc::as_ptr(&self.handle.0)) {
            panic!("component `{key}` cannot render itself as a child");
        }
        child.set_parent(self.handle);
        child.set_props(props);
        child.render_node(self.context)
    }

    /// Render a transient child: built now, dropped after the pass.
    pub fn transient<D: Component>(&self, component: D, props: D::Props) -> Node {
        let child = self.context.transient_component(component);
        child.set_parent(self.handle);
        child.set_props(props);
        child.render_node(self.context)
    }
}
