//! Out-of-band per-view records the engine reads and writes.

use bitflags::bitflags;

use crate::engine::{Key, RenderContext, ReuseTag};
use crate::layout::FlexStyle;

bitflags! {
    /// Engine-owned flags on a native view.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ViewFlags: u8 {
        /// The view was created for (and is managed by) a node.
        const HAS_NODE = 0b0000_0001;
        /// Created in the current pass rather than reused.
        const NEWLY_CREATED = 0b0000_0010;
        /// Leaf sized from its content during measurement.
        const MEASURES_CONTENT = 0b0000_0100;
    }
}

/// Metadata slots attached to every view in a [`ViewTree`](super::ViewTree).
#[derive(Default)]
pub struct ViewMetadata {
    pub flags: ViewFlags,
    /// Hash of the reuse category of the node that created the view.
    pub reuse_tag: Option<ReuseTag>,
    /// Instance key of the node bound in the last pass.
    pub instance_key: Option<String>,
    /// Currently applied bindings and cached original values.
    pub render_context: RenderContext,
    /// Layout handle handed to `configure` closures.
    pub layout: FlexStyle,
}

impl ViewMetadata {
    #[inline]
    pub fn has_node(&self) -> bool {
        self.flags.contains(ViewFlags::HAS_NODE)
    }

    #[inline]
    pub fn is_newly_created(&self) -> bool {
        self.flags.contains(ViewFlags::NEWLY_CREATED)
    }

    /// True if a node with `tag` may take over this view.
    #[inline]
    pub fn accepts(&self, tag: ReuseTag) -> bool {
        self.has_node() && self.reuse_tag == Some(tag)
    }

    /// True if the node keyed `key` is the one that owned this view.
    ///
    /// Siblings sharing a reuse category never take over each other's views.
    pub fn matches(&self, key: &Key) -> bool {
        self.accepts(key.reuse_tag()) && self.instance_key.as_deref() == Some(key.instance_key())
    }

    /// Record ownership by the node keyed `key`.
    pub fn adopt(&mut self, key: &Key) {
        self.flags.insert(ViewFlags::HAS_NODE);
        self.reuse_tag = Some(key.reuse_tag());
        self.instance_key = Some(key.instance_key().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_requires_node_flag() {
        let tag = ReuseTag::of("Label");
        let mut meta = ViewMetadata {
            reuse_tag: Some(tag),
            ..Default::default()
        };
        assert!(!meta.accepts(tag));

        meta.flags.insert(ViewFlags::HAS_NODE);
        assert!(meta.accepts(tag));
        assert!(!meta.accepts(ReuseTag::of("Button")));
    }

    #[test]
    fn test_matches_requires_same_instance_key() {
        let mut meta = ViewMetadata::default();
        meta.adopt(&Key::new("Cell", "cell-3"));

        assert!(meta.matches(&Key::new("Cell", "cell-3")));
        assert!(!meta.matches(&Key::new("Cell", "cell-4")));
        assert!(!meta.matches(&Key::new("Label", "cell-3")));
    }
}
