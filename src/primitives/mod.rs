//! Primitives - Headless reference views.
//!
//! Plain in-memory views with property descriptors, for hosts without a
//! toolkit of their own and for tests:
//! - [`Container`] - Background, opacity and corner radius; holds children
//! - [`Label`] - Text sized by wrapping at the available width
//! - [`Button`] - Title plus a tap handler that is reset on every pass
//!
//! # Example
//!
//! ```
//! use render_tree::engine::Node;
//! use render_tree::primitives::{Button, Container, Label};
//! use render_tree::types::Rgba;
//!
//! let node = Node::configured(Container::default, |cfg| {
//!     cfg.set(Container::BACKGROUND, Rgba::WHITE);
//!     cfg.layout().set_gap(4.0);
//! })
//! .with_children([
//!     Node::configured(Label::default, |cfg| {
//!         cfg.set(Label::TEXT, "Title");
//!     }),
//!     Node::configured(Button::default, |cfg| {
//!         cfg.set(Button::TITLE, "OK");
//!         cfg.set_unchecked(Button::ON_TAP, Button::handler(|| println!("tapped")));
//!     }),
//! ]);
//! assert_eq!(node.children().len(), 2);
//! ```

mod button;
mod container;
mod label;

pub use button::{Button, TapHandler};
pub use container::Container;
pub use label::Label;
