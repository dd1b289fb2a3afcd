//! Host toolkit boundary.
//!
//! The engine talks to native views through two pieces:
//! - [`NativeView`]: hooks a backing view type implements
//! - [`ViewTree`]: the hierarchy those views live in, plus the per-view
//!   metadata slots (`HAS_NODE`, reuse tag, render context, layout handle)
//!
//! # Architecture
//!
//! ```text
//! Node tree (per pass) ──reconcile──▶ ViewTree (persistent) ──frames──▶ NativeView
//! ```

mod metadata;
mod view;
mod view_tree;

pub use metadata::{ViewFlags, ViewMetadata};
pub use view::{AsAny, NativeView};
pub use view_tree::{TreeStats, ViewError, ViewId, ViewParts, ViewTree};
