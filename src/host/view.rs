//! The native view boundary.
//!
//! Host toolkits implement [`NativeView`] for each backing view type. The
//! engine never inspects a view beyond this trait; typed access goes through
//! downcasting, which is how property bindings reach the concrete view.

use std::any::Any;

use crate::engine::Transition;
use crate::layout::LayoutAnimator;
use crate::types::{Frame, Size};

/// Object-safe access to `Any` for trait objects.
///
/// Implemented for every `'static` type, so view types never write it by hand.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A view owned by the host toolkit.
///
/// Every hook has a no-op default; a plain view only needs an empty impl.
///
/// # Example
///
/// ```
/// use render_tree::host::NativeView;
///
/// #[derive(Default)]
/// struct Spacer;
///
/// impl NativeView for Spacer {}
/// ```
pub trait NativeView: AsAny {
    /// Type tag used in diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Drop interactive handlers (tap targets, text observers) before the
    /// view is configured again.
    fn reset_targets(&mut self) {}

    /// Return to a pristine state when reused by a node that asked for it.
    fn prepare_for_reuse(&mut self) {}

    /// Release gesture and event registrations owned by this view.
    fn flush_gestures(&mut self) {}

    /// Runs after the view's bindings for the pass have been committed.
    fn post_render(&mut self) {}

    /// Preferred content size for a leaf view.
    ///
    /// `available` may be infinite on either axis. `None` means the view has
    /// no content of its own and collapses to zero.
    fn intrinsic_size(&self, available: Size) -> Option<Size> {
        let _ = available;
        None
    }

    /// The engine wrote a new frame.
    fn frame_did_change(&mut self, frame: Frame) {
        let _ = frame;
    }

    /// Animate from `from` to `to`. Fire-and-forget: the engine has already
    /// recorded `to` as the view's frame.
    fn animate_frame(&mut self, from: Frame, to: Frame, animator: &LayoutAnimator) {
        let _ = (from, animator);
        self.frame_did_change(to);
    }

    /// A binding with a transition is about to set `property`.
    fn will_transition(&mut self, property: &'static str, transition: &Transition) {
        let _ = (property, transition);
    }
}

impl dyn NativeView {
    pub fn is<V: NativeView>(&self) -> bool {
        self.as_any().is::<V>()
    }

    pub fn downcast_ref<V: NativeView>(&self) -> Option<&V> {
        self.as_any().downcast_ref::<V>()
    }

    pub fn downcast_mut<V: NativeView>(&mut self) -> Option<&mut V> {
        self.as_any_mut().downcast_mut::<V>()
    }
}
