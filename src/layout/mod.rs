//! Layout - Flexbox measurement through an external solver.
//!
//! # Architecture
//!
//! The engine never does layout math itself. It hands the solver a view
//! subtree whose metadata carries one [`FlexStyle`] per view, then:
//!
//! 1. Measures the root against the available size (axes may be unbounded)
//! 2. Measures again, bounded by the intrinsic size from step 1
//! 3. Arranges: frames are normalized and written onto the views
//!
//! [`TaffySolver`] is the default solver, backed by
//! [Taffy](https://github.com/DioxusLabs/taffy).
//!
//! # Example
//!
//! ```
//! use render_tree::host::{NativeView, ViewTree};
//! use render_tree::layout::{layout_two_pass, TaffySolver};
//! use render_tree::types::Size;
//!
//! struct Panel;
//! impl NativeView for Panel {}
//!
//! let mut tree = ViewTree::new();
//! let root = tree.create(Panel);
//! tree.metadata_mut(root).unwrap().layout.set_size(120.0, 40.0);
//!
//! let mut solver = TaffySolver::new();
//! let size = layout_two_pass(&mut solver, &mut tree, root, Size::new(320.0, 480.0), false, None).unwrap();
//! assert_eq!(size, Size::new(120.0, 40.0));
//! ```

mod flex_style;
mod solver;
mod taffy_bridge;
mod text_measure;

pub use flex_style::FlexStyle;
pub use solver::{layout_two_pass, LayoutAnimator, LayoutError, LayoutSolver};
pub use taffy_bridge::TaffySolver;
pub use text_measure::{char_width, measure_text_height, string_width, text_size, wrap_text};
