//! Layout solver contract and the two-pass driver.

use std::time::Duration;

use thiserror::Error;

use crate::engine::Curve;
use crate::host::{ViewId, ViewTree};
use crate::types::Size;

/// Failures while building or solving a layout tree.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("view {0:?} is not in the view tree")]
    MissingView(ViewId),

    #[error("arrange called before measure for {0:?}")]
    NotMeasured(ViewId),

    #[error(transparent)]
    Taffy(#[from] taffy::TaffyError),
}

/// Animation applied to frame changes of a whole pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutAnimator {
    pub duration: Duration,
    pub curve: Curve,
}

impl LayoutAnimator {
    pub const fn new(duration: Duration, curve: Curve) -> Self {
        Self { duration, curve }
    }
}

impl Default for LayoutAnimator {
    fn default() -> Self {
        Self::new(Duration::from_millis(250), Curve::EaseInOut)
    }
}

/// External flexbox engine.
///
/// `measure` is pure given the view tree's layout handles and content;
/// `arrange` writes the frames of the most recent measurement.
pub trait LayoutSolver {
    /// Size `root` and its subtree against `available`. Infinite axes are
    /// unbounded.
    fn measure(&mut self, tree: &ViewTree, root: ViewId, available: Size)
    -> Result<Size, LayoutError>;

    /// Write frames for every view measured under `root`.
    fn arrange(
        &mut self,
        tree: &mut ViewTree,
        root: ViewId,
        animator: Option<&LayoutAnimator>,
    ) -> Result<(), LayoutError>;
}

/// Measure `root` twice and arrange.
///
/// The first pass resolves an intrinsic size against `available`; that size
/// then bounds the second pass, which is when content such as wrapped text
/// settles. With `skip_redundant` the second pass is dropped if the first
/// returned exactly `available`.
///
/// Returns the final root size.
pub fn layout_two_pass(
    solver: &mut dyn LayoutSolver,
    tree: &mut ViewTree,
    root: ViewId,
    available: Size,
    skip_redundant: bool,
    animator: Option<&LayoutAnimator>,
) -> Result<Size, LayoutError> {
    let intrinsic = solver.measure(tree, root, available)?.normalized();

    let size = if skip_redundant && intrinsic == available {
        intrinsic
    } else {
        solver.measure(tree, root, intrinsic)?.normalized()
    };

    solver.arrange(tree, root, animator)?;
    Ok(size)
}
