//! # render-tree
//!
//! Declarative node trees reconciled onto native view hierarchies.
//!
//! ## Architecture
//!
//! A component's render function returns a tree of lightweight [`Node`]s. The
//! reconciler matches that tree against the views that survived the previous
//! pass, reuses what it can, creates and removes the rest, applies property
//! bindings and hands the result to a flexbox solver:
//!
//! ```text
//! set_state → request_render → render → diff → configure → measure ×2 → arrange → flush pool
//! ```
//!
//! Component state lives in a per-tree identity pool keyed by node key. Keys
//! that do not appear in a pass are evicted at the end of it.
//!
//! ## Modules
//!
//! - [`types`] - Geometry, colors and flexbox enums
//! - [`engine`] - Nodes, bindings, components, the identity pool and the reconciler
//! - [`host`] - Native view trait and the view tree arena
//! - [`layout`] - Layout solver contract, Taffy bridge, text measurement
//! - [`style`] - Stylesheet bridge
//! - [`primitives`] - Headless reference views
//!
//! ## Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use render_tree::{Canvas, Component, Context, Node, RenderCx, RenderOptions, ViewTree};
//! use render_tree::primitives::{Button, Container, Label};
//! use render_tree::types::{Frame, Size};
//!
//! struct Counter;
//!
//! impl Component for Counter {
//!     type State = i32;
//!     type Props = ();
//!
//!     fn render(&self, cx: &RenderCx<'_, Self>) -> Node {
//!         let count = cx.state();
//!         let parity = if count % 2 == 0 { "Even" } else { "Odd" };
//!         let text = format!("{parity}: {count}");
//!         let counter = cx.weak();
//!
//!         Node::new(Container::default).with_children([
//!             Node::configured(Label::default, move |cfg| {
//!                 cfg.set(Label::TEXT, text.clone());
//!             }),
//!             Node::configured(Button::default, move |cfg| {
//!                 let counter = counter.clone();
//!                 cfg.set(Button::TITLE, "Increment");
//!                 cfg.set_unchecked(Button::ON_TAP, Button::handler(move || counter.set_state(|n| *n += 1)));
//!             }),
//!         ])
//!     }
//! }
//!
//! let tree = Rc::new(RefCell::new(ViewTree::new()));
//! let canvas = tree.borrow_mut().create(Container::default());
//! tree.borrow_mut().set_frame(canvas, Frame::new(0.0, 0.0, 320.0, 480.0)).unwrap();
//!
//! let context = Context::new();
//! let counter = context.component("counter", || Counter);
//! counter.set_canvas(Canvas::new(tree.clone(), canvas));
//! counter.request_render(RenderOptions::empty());
//!
//! counter.set_state(|n| *n += 1);
//! assert_eq!(counter.state(), 1);
//! assert_eq!(context.last_report().unwrap().created, 0);
//! ```

pub mod engine;
pub mod host;
pub mod layout;
pub mod primitives;
pub mod style;
pub mod types;

// Re-export commonly used items
pub use engine::{
    Canvas, CanvasOptions, Component, ComponentHandle, Config, Context, ContextConfig, Key, Node,
    Property, ReconcileReport, Reconciler, RenderCx, RenderObserver, RenderOptions, Transition,
    ViewRef, WeakHandle,
};

pub use host::{NativeView, ViewError, ViewId, ViewTree};

pub use layout::{FlexStyle, LayoutAnimator, LayoutError, LayoutSolver, TaffySolver};

pub use style::{StyleError, StyleRegistry, StyleSheet, StyleValue};
