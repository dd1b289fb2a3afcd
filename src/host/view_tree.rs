//! View Tree - Arena mirror of the host's native view hierarchy.
//!
//! Views live in slots addressed by [`ViewId`]:
//! - Free slot pool for O(1) reuse of released slots
//! - Generation counter per slot so a stale id never aliases a new view
//! - Parent links are plain ids, children are ordered id lists
//! - Releasing a view releases its whole subtree
//!
//! The tree is the only owner of native views. Nodes refer to views by id,
//! and views never point back at nodes or components.

use std::collections::HashMap;

use thiserror::Error;

use super::metadata::{ViewFlags, ViewMetadata};
use super::view::NativeView;
use crate::layout::LayoutAnimator;
use crate::types::Frame;

/// Handle to a view in a [`ViewTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId {
    index: usize,
    generation: u32,
}

impl ViewId {
    /// Slot position, stable for the lifetime of the view.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Errors from structural operations on the view tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("view {0:?} does not exist")]
    Missing(ViewId),

    #[error("view {id:?} is a {actual}, expected {expected}")]
    TypeMismatch {
        id: ViewId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("cannot insert {child:?} under its own descendant {parent:?}")]
    Cycle { parent: ViewId, child: ViewId },
}

/// Lifetime counters, mostly useful to assert reuse in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    pub created: usize,
    pub released: usize,
}

struct ViewEntry {
    view: Box<dyn NativeView>,
    parent: Option<ViewId>,
    children: Vec<ViewId>,
    frame: Frame,
    meta: ViewMetadata,
}

struct Slot {
    generation: u32,
    entry: Option<ViewEntry>,
}

/// Mutable access to the parts of one view the configure pass touches.
pub struct ViewParts<'a> {
    pub view: &'a mut dyn NativeView,
    pub meta: &'a mut ViewMetadata,
    pub frame: &'a mut Frame,
}

type ReleaseCallback = Box<dyn FnOnce()>;

/// Native view hierarchy.
#[derive(Default)]
pub struct ViewTree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    release_callbacks: HashMap<ViewId, Vec<ReleaseCallback>>,
    stats: TreeStats,
}

impl ViewTree {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Adopt a view. It starts detached with default metadata.
    pub fn create(&mut self, view: impl NativeView) -> ViewId {
        self.create_boxed(Box::new(view))
    }

    pub fn create_boxed(&mut self, view: Box<dyn NativeView>) -> ViewId {
        let entry = ViewEntry {
            view,
            parent: None,
            children: Vec::new(),
            frame: Frame::ZERO,
            meta: ViewMetadata::default(),
        };

        self.stats.created += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.entry = Some(entry);
            return ViewId {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        ViewId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Register a callback to run when `id` is released.
    pub fn on_release(&mut self, id: ViewId, callback: impl FnOnce() + 'static) {
        self.release_callbacks
            .entry(id)
            .or_default()
            .push(Box::new(callback));
    }

    /// Release a view and its subtree. The view must already be detached.
    fn release(&mut self, id: ViewId) {
        let Some(entry) = self.take_entry(id) else { return };

        for child in entry.children {
            self.release(child);
        }

        if let Some(callbacks) = self.release_callbacks.remove(&id) {
            for callback in callbacks {
                callback();
            }
        }

        let slot = &mut self.slots[id.index];
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.stats.released += 1;
    }

    fn take_entry(&mut self, id: ViewId) -> Option<ViewEntry> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.take()
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    fn entry(&self, id: ViewId) -> Option<&ViewEntry> {
        let slot = self.slots.get(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, id: ViewId) -> Option<&mut ViewEntry> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.entry(id).is_some()
    }

    /// Number of live views.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    pub fn parent(&self, id: ViewId) -> Option<ViewId> {
        self.entry(id)?.parent
    }

    /// Ordered subviews; empty for a missing view.
    pub fn subviews(&self, id: ViewId) -> &[ViewId] {
        self.entry(id).map_or(&[], |entry| entry.children.as_slice())
    }

    /// Position of `id` among its parent's subviews.
    pub fn index_in_parent(&self, id: ViewId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.subviews(parent).iter().position(|&child| child == id)
    }

    pub fn view(&self, id: ViewId) -> Option<&dyn NativeView> {
        self.entry(id).map(|entry| entry.view.as_ref())
    }

    pub fn view_mut(&mut self, id: ViewId) -> Option<&mut dyn NativeView> {
        self.entry_mut(id).map(|entry| entry.view.as_mut())
    }

    /// Typed view access.
    pub fn downcast<V: NativeView>(&self, id: ViewId) -> Result<&V, ViewError> {
        let view = self.view(id).ok_or(ViewError::Missing(id))?;
        let actual = view.type_name();
        view.downcast_ref::<V>().ok_or(ViewError::TypeMismatch {
            id,
            expected: std::any::type_name::<V>(),
            actual,
        })
    }

    pub fn downcast_mut<V: NativeView>(&mut self, id: ViewId) -> Result<&mut V, ViewError> {
        let view = self.view_mut(id).ok_or(ViewError::Missing(id))?;
        let actual = view.type_name();
        view.downcast_mut::<V>().ok_or(ViewError::TypeMismatch {
            id,
            expected: std::any::type_name::<V>(),
            actual,
        })
    }

    pub fn metadata(&self, id: ViewId) -> Option<&ViewMetadata> {
        self.entry(id).map(|entry| &entry.meta)
    }

    pub fn metadata_mut(&mut self, id: ViewId) -> Option<&mut ViewMetadata> {
        self.entry_mut(id).map(|entry| &mut entry.meta)
    }

    /// Split borrow of view, metadata and frame.
    pub fn parts_mut(&mut self, id: ViewId) -> Option<ViewParts<'_>> {
        self.entry_mut(id).map(|entry| ViewParts {
            view: entry.view.as_mut(),
            meta: &mut entry.meta,
            frame: &mut entry.frame,
        })
    }

    /// All views below `id`, depth-first, excluding `id` itself.
    pub fn descendants(&self, id: ViewId) -> Vec<ViewId> {
        let mut out = Vec::new();
        let mut stack: Vec<ViewId> = self.subviews(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.subviews(next).iter().rev().copied());
        }
        out
    }

    // =========================================================================
    // Frames
    // =========================================================================

    pub fn frame(&self, id: ViewId) -> Option<Frame> {
        self.entry(id).map(|entry| entry.frame)
    }

    /// Write a frame. Non-finite geometry is normalized to zero first.
    pub fn set_frame(&mut self, id: ViewId, frame: Frame) -> Result<(), ViewError> {
        let entry = self.entry_mut(id).ok_or(ViewError::Missing(id))?;
        let frame = frame.normalized();
        if entry.frame != frame {
            entry.frame = frame;
            entry.view.frame_did_change(frame);
        }
        Ok(())
    }

    /// Like [`set_frame`](Self::set_frame), but hands the change to the
    /// view's animation hook.
    pub fn animate_frame(
        &mut self,
        id: ViewId,
        frame: Frame,
        animator: &LayoutAnimator,
    ) -> Result<(), ViewError> {
        let entry = self.entry_mut(id).ok_or(ViewError::Missing(id))?;
        let frame = frame.normalized();
        if entry.frame != frame {
            let from = entry.frame;
            entry.frame = frame;
            entry.view.animate_frame(from, frame, animator);
        }
        Ok(())
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Insert `child` under `parent` at `index` (clamped to the subview
    /// count). A child that already has a parent is moved.
    pub fn insert_subview(
        &mut self,
        parent: ViewId,
        child: ViewId,
        index: usize,
    ) -> Result<(), ViewError> {
        if !self.contains(parent) {
            return Err(ViewError::Missing(parent));
        }
        if !self.contains(child) {
            return Err(ViewError::Missing(child));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(ViewError::Cycle { parent, child });
        }

        self.detach(child);

        let siblings = &mut self
            .entry_mut(parent)
            .ok_or(ViewError::Missing(parent))?
            .children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);

        if let Some(entry) = self.entry_mut(child) {
            entry.parent = Some(parent);
        }
        Ok(())
    }

    /// Append `child` as the last subview of `parent`.
    pub fn add_subview(&mut self, parent: ViewId, child: ViewId) -> Result<(), ViewError> {
        self.insert_subview(parent, child, usize::MAX)
    }

    /// Detach `id` from its parent and destroy it with its subtree.
    ///
    /// Gesture registrations of the whole subtree are flushed first.
    /// Returns the number of views released.
    pub fn remove_from_parent(&mut self, id: ViewId) -> Result<usize, ViewError> {
        if !self.contains(id) {
            return Err(ViewError::Missing(id));
        }

        self.flush_gestures_recursive(id);
        self.detach(id);

        let before = self.stats.released;
        self.release(id);
        Ok(self.stats.released - before)
    }

    /// Flush gesture registrations of `id` only.
    pub fn flush_gestures(&mut self, id: ViewId) {
        if let Some(view) = self.view_mut(id) {
            view.flush_gestures();
        }
    }

    /// Flush gesture registrations of `id` and every descendant.
    pub fn flush_gestures_recursive(&mut self, id: ViewId) {
        self.flush_gestures(id);
        for view in self.descendants(id) {
            self.flush_gestures(view);
        }
    }

    /// Unlink `id` from its parent, keeping it alive.
    fn detach(&mut self, id: ViewId) {
        let Some(parent) = self.parent(id) else { return };
        if let Some(entry) = self.entry_mut(parent) {
            entry.children.retain(|&child| child != id);
        }
        if let Some(entry) = self.entry_mut(id) {
            entry.parent = None;
        }
    }

    fn is_ancestor(&self, ancestor: ViewId, id: ViewId) -> bool {
        let mut current = self.parent(id);
        while let Some(view) = current {
            if view == ancestor {
                return true;
            }
            current = self.parent(view);
        }
        false
    }

    /// Views under `id` that were created by nodes.
    pub fn node_subviews(&self, id: ViewId) -> Vec<ViewId> {
        self.subviews(id)
            .iter()
            .copied()
            .filter(|&child| {
                self.metadata(child)
                    .is_some_and(|meta| meta.flags.contains(ViewFlags::HAS_NODE))
            })
            .collect()
    }
}
