//! FlexStyle - The layout handle a configure closure writes into.
//!
//! Every view carries one `FlexStyle` in its metadata. It is reset to the
//! defaults before each configure call, so a property a closure stops
//! setting falls back to its default instead of leaking from the last pass.
//!
//! # Example
//!
//! ```
//! use render_tree::layout::FlexStyle;
//! use render_tree::types::{Dimension, Edges, FlexDirection};
//!
//! let mut style = FlexStyle::default();
//! style.flex_direction = FlexDirection::Row;
//! style.width = Dimension::Points(320.0);
//! style.padding = Edges::all(8.0);
//! assert!(style.has_explicit_size());
//! ```

use crate::types::{
    AlignContent, AlignItems, AlignSelf, Dimension, Edges, FlexDirection, FlexWrap,
    JustifyContent, Overflow, Position,
};

/// Flexbox parameters of one view.
#[derive(Debug, Clone, PartialEq)]
pub struct FlexStyle {
    // =========================================================================
    // Container
    // =========================================================================
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub align_content: AlignContent,

    // =========================================================================
    // Item
    // =========================================================================
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: Dimension,
    pub align_self: AlignSelf,

    // =========================================================================
    // Dimensions
    // =========================================================================
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub min_height: Dimension,
    pub max_width: Dimension,
    pub max_height: Dimension,

    // =========================================================================
    // Spacing
    // =========================================================================
    pub margin: Edges,
    pub padding: Edges,
    pub border: Edges,
    pub row_gap: f32,
    pub column_gap: f32,

    // =========================================================================
    // Other
    // =========================================================================
    pub position: Position,
    pub overflow: Overflow,
    /// Excluded from layout entirely (`display: none`).
    pub hidden: bool,
}

impl Default for FlexStyle {
    fn default() -> Self {
        Self {
            flex_direction: FlexDirection::Column,
            flex_wrap: FlexWrap::NoWrap,
            justify_content: JustifyContent::FlexStart,
            align_items: AlignItems::Stretch,
            align_content: AlignContent::Stretch,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: Dimension::Auto,
            align_self: AlignSelf::Auto,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            min_height: Dimension::Auto,
            max_width: Dimension::Auto,
            max_height: Dimension::Auto,
            margin: Edges::ZERO,
            padding: Edges::ZERO,
            border: Edges::ZERO,
            row_gap: 0.0,
            column_gap: 0.0,
            position: Position::Relative,
            overflow: Overflow::Visible,
            hidden: false,
        }
    }
}

impl FlexStyle {
    /// True if either axis has a width/height other than `Auto`. One sized
    /// axis is enough to keep an empty leaf from collapsing.
    pub fn has_explicit_size(&self) -> bool {
        !self.width.is_auto() || !self.height.is_auto()
    }

    /// Set both dimensions in points.
    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = Dimension::Points(width);
        self.height = Dimension::Points(height);
    }

    /// Same gap along both axes.
    pub fn set_gap(&mut self, gap: f32) {
        self.row_gap = gap;
        self.column_gap = gap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_flexbox_initial_values() {
        let style = FlexStyle::default();
        assert_eq!(style.flex_shrink, 1.0);
        assert_eq!(style.flex_grow, 0.0);
        assert_eq!(style.align_items, AlignItems::Stretch);
        assert!(!style.has_explicit_size());
    }

    #[test]
    fn test_helpers() {
        let mut style = FlexStyle::default();
        style.set_size(10.0, 20.0);
        style.set_gap(4.0);
        assert!(style.has_explicit_size());
        assert_eq!(style.height, Dimension::Points(20.0));
        assert_eq!(style.row_gap, style.column_gap);
    }

    #[test]
    fn test_one_axis_is_explicit() {
        let mut style = FlexStyle::default();
        style.height = Dimension::Points(12.0);
        assert!(style.has_explicit_size());
    }
}
