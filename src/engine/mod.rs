//! Render Engine - Nodes, components and reconciliation.
//!
//! The engine turns render output into native views:
//! - Key: Node identity (reuse category + instance key)
//! - Binding: Reversible typed property assignments
//! - Node: Per-pass descriptor of one view and its children
//! - Context: Identity pool for state and components, render coordination
//! - Component: Stateful render functions and the re-render trigger
//! - Reconciler: Tree diff, configure pass, layout
//!
//! # Architecture
//!
//! Nodes are NOT views. They are thrown away after every pass; views persist
//! in the [`ViewTree`](crate::host::ViewTree) and are handed from one pass's
//! node to the next one with the same key:
//!
//! ```text
//! pass 1: Node(Label, "title") ──create──▶ view #3
//! pass 2: Node(Label, "title") ──reuse───▶ view #3   (bindings diffed)
//! pass 3: (no such node)       ──remove──▶ view #3 released
//! ```
//!
//! All of it runs on the thread that created the [`Context`].

mod binding;
mod component;
mod context;
mod key;
mod node;
mod reconciler;
mod thread;

pub use binding::{
    AnyBinding, BindingOutcome, BindingSet, BindingStats, Curve, InitialValues, Property,
    PropertyId, RenderContext, Transition,
};
pub use component::{
    AnyComponent, Canvas, CanvasOptions, Component, ComponentHandle, Props, RenderCx,
    RenderOptions, State, WeakHandle,
};
pub use context::{Context, ContextConfig, IdentityPool, RenderObserver};
pub use key::{Key, ReuseTag};
pub use node::{Config, Node, ViewRef};
pub use reconciler::{ReconcileReport, Reconciler};
pub use thread::UiThread;
