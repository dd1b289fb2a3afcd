//! Taffy Bridge - Default layout solver backed by Taffy.
//!
//! Converts each view's [`FlexStyle`] to a Taffy style, mirrors the view
//! subtree into a Taffy tree, computes layout, and writes frames back.
//! Leaf views are measured through [`NativeView::intrinsic_size`].

use taffy::{
    AlignContent as TaffyAlignContent, AlignItems as TaffyAlignItems,
    AlignSelf as TaffyAlignSelf, AvailableSpace, Dimension as TaffyDimension, Display,
    FlexDirection as TaffyFlexDirection, FlexWrap as TaffyFlexWrap,
    JustifyContent as TaffyJustifyContent, LengthPercentage, LengthPercentageAuto, NodeId,
    Overflow as TaffyOverflow, Position as TaffyPosition, Rect, Size as TaffySize, Style,
    TaffyTree,
};

use super::flex_style::FlexStyle;
use super::solver::{LayoutAnimator, LayoutError, LayoutSolver};
use crate::host::{ViewFlags, ViewId, ViewTree};
use crate::types::{
    AlignContent, AlignItems, AlignSelf, Dimension, Edges, FlexDirection, FlexWrap, Frame,
    JustifyContent, Overflow, Position, Size,
};

// =============================================================================
// DIMENSION CONVERSION
// =============================================================================

fn to_taffy_dimension(dim: Dimension) -> TaffyDimension {
    match dim {
        Dimension::Auto => TaffyDimension::Auto,
        Dimension::Points(n) => TaffyDimension::Length(n),
        Dimension::Percent(p) => TaffyDimension::Percent(p / 100.0),
    }
}

fn to_taffy_lpa(value: f32) -> LengthPercentageAuto {
    LengthPercentageAuto::Length(value)
}

fn to_taffy_lp(value: f32) -> LengthPercentage {
    LengthPercentage::Length(value)
}

fn to_taffy_rect<T>(edges: Edges, convert: fn(f32) -> T) -> Rect<T> {
    Rect {
        top: convert(edges.top),
        right: convert(edges.right),
        bottom: convert(edges.bottom),
        left: convert(edges.left),
    }
}

fn to_available_space(value: f32) -> AvailableSpace {
    if value.is_finite() {
        AvailableSpace::Definite(value)
    } else {
        AvailableSpace::MaxContent
    }
}

fn from_available_space(space: AvailableSpace) -> f32 {
    match space {
        AvailableSpace::Definite(value) => value,
        AvailableSpace::MinContent => 0.0,
        AvailableSpace::MaxContent => f32::INFINITY,
    }
}

// =============================================================================
// ENUM CONVERSIONS
// =============================================================================

fn to_taffy_flex_direction(dir: FlexDirection) -> TaffyFlexDirection {
    match dir {
        FlexDirection::Column => TaffyFlexDirection::Column,
        FlexDirection::Row => TaffyFlexDirection::Row,
        FlexDirection::ColumnReverse => TaffyFlexDirection::ColumnReverse,
        FlexDirection::RowReverse => TaffyFlexDirection::RowReverse,
    }
}

fn to_taffy_flex_wrap(wrap: FlexWrap) -> TaffyFlexWrap {
    match wrap {
        FlexWrap::NoWrap => TaffyFlexWrap::NoWrap,
        FlexWrap::Wrap => TaffyFlexWrap::Wrap,
        FlexWrap::WrapReverse => TaffyFlexWrap::WrapReverse,
    }
}

fn to_taffy_justify_content(justify: JustifyContent) -> Option<TaffyJustifyContent> {
    Some(match justify {
        JustifyContent::FlexStart => TaffyJustifyContent::FlexStart,
        JustifyContent::Center => TaffyJustifyContent::Center,
        JustifyContent::FlexEnd => TaffyJustifyContent::FlexEnd,
        JustifyContent::SpaceBetween => TaffyJustifyContent::SpaceBetween,
        JustifyContent::SpaceAround => TaffyJustifyContent::SpaceAround,
        JustifyContent::SpaceEvenly => TaffyJustifyContent::SpaceEvenly,
    })
}

fn to_taffy_align_items(align: AlignItems) -> Option<TaffyAlignItems> {
    Some(match align {
        AlignItems::Stretch => TaffyAlignItems::Stretch,
        AlignItems::FlexStart => TaffyAlignItems::FlexStart,
        AlignItems::Center => TaffyAlignItems::Center,
        AlignItems::FlexEnd => TaffyAlignItems::FlexEnd,
        AlignItems::Baseline => TaffyAlignItems::Baseline,
    })
}

fn to_taffy_align_content(align: AlignContent) -> Option<TaffyAlignContent> {
    Some(match align {
        AlignContent::Stretch => TaffyAlignContent::Stretch,
        AlignContent::FlexStart => TaffyAlignContent::FlexStart,
        AlignContent::Center => TaffyAlignContent::Center,
        AlignContent::FlexEnd => TaffyAlignContent::FlexEnd,
        AlignContent::SpaceBetween => TaffyAlignContent::SpaceBetween,
        AlignContent::SpaceAround => TaffyAlignContent::SpaceAround,
    })
}

fn to_taffy_align_self(align: AlignSelf) -> Option<TaffyAlignSelf> {
    match align {
        AlignSelf::Auto => None,
        AlignSelf::Stretch => Some(TaffyAlignSelf::Stretch),
        AlignSelf::FlexStart => Some(TaffyAlignSelf::FlexStart),
        AlignSelf::Center => Some(TaffyAlignSelf::Center),
        AlignSelf::FlexEnd => Some(TaffyAlignSelf::FlexEnd),
        AlignSelf::Baseline => Some(TaffyAlignSelf::Baseline),
    }
}

fn to_taffy_overflow(overflow: Overflow) -> TaffyOverflow {
    match overflow {
        Overflow::Visible => TaffyOverflow::Visible,
        Overflow::Hidden => TaffyOverflow::Clip,
        Overflow::Scroll => TaffyOverflow::Scroll,
    }
}

fn to_taffy_position(position: Position) -> TaffyPosition {
    match position {
        Position::Relative => TaffyPosition::Relative,
        Position::Absolute => TaffyPosition::Absolute,
    }
}

// =============================================================================
// STYLE BUILDING
// =============================================================================

/// Build a Taffy style from a view's layout handle.
fn build_style(style: &FlexStyle) -> Style {
    Style {
        display: if style.hidden { Display::None } else { Display::Flex },
        position: to_taffy_position(style.position),

        flex_direction: to_taffy_flex_direction(style.flex_direction),
        flex_wrap: to_taffy_flex_wrap(style.flex_wrap),
        justify_content: to_taffy_justify_content(style.justify_content),
        align_items: to_taffy_align_items(style.align_items),
        align_content: to_taffy_align_content(style.align_content),

        flex_grow: style.flex_grow,
        flex_shrink: style.flex_shrink,
        flex_basis: to_taffy_dimension(style.flex_basis),
        align_self: to_taffy_align_self(style.align_self),

        size: TaffySize {
            width: to_taffy_dimension(style.width),
            height: to_taffy_dimension(style.height),
        },
        min_size: TaffySize {
            width: to_taffy_dimension(style.min_width),
            height: to_taffy_dimension(style.min_height),
        },
        max_size: TaffySize {
            width: to_taffy_dimension(style.max_width),
            height: to_taffy_dimension(style.max_height),
        },

        margin: to_taffy_rect(style.margin, to_taffy_lpa),
        padding: to_taffy_rect(style.padding, to_taffy_lp),
        border: to_taffy_rect(style.border, to_taffy_lp),
        gap: TaffySize {
            width: to_taffy_lp(style.column_gap),
            height: to_taffy_lp(style.row_gap),
        },

        overflow: taffy::Point {
            x: to_taffy_overflow(style.overflow),
            y: to_taffy_overflow(style.overflow),
        },

        ..Default::default()
    }
}

// =============================================================================
// SOLVER
// =============================================================================

/// [`LayoutSolver`] backed by a Taffy tree rebuilt on every measurement.
pub struct TaffySolver {
    taffy: TaffyTree<ViewId>,
    /// View → Taffy node pairs of the last measurement, parents first.
    nodes: Vec<(ViewId, NodeId)>,
    root: Option<ViewId>,
}

impl Default for TaffySolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TaffySolver {
    pub fn new() -> Self {
        Self {
            taffy: TaffyTree::new(),
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Mirror the subtree under `view` into the Taffy tree.
    fn build(&mut self, tree: &ViewTree, view: ViewId) -> Result<NodeId, LayoutError> {
        let meta = tree.metadata(view).ok_or(LayoutError::MissingView(view))?;
        let style = build_style(&meta.layout);
        let subviews = tree.subviews(view);

        let node = if subviews.is_empty() {
            self.taffy.new_leaf_with_context(style, view)?
        } else {
            self.taffy.new_leaf(style)?
        };
        self.nodes.push((view, node));

        for &child in subviews {
            let child_node = self.build(tree, child)?;
            self.taffy.add_child(node, child_node)?;
        }
        Ok(node)
    }
}

impl LayoutSolver for TaffySolver {
    fn measure(
        &mut self,
        tree: &ViewTree,
        root: ViewId,
        available: Size,
    ) -> Result<Size, LayoutError> {
        self.taffy = TaffyTree::new();
        self.nodes.clear();
        self.root = None;

        let root_node = self.build(tree, root)?;

        let available_space = TaffySize {
            width: to_available_space(available.width),
            height: to_available_space(available.height),
        };

        // Leaves measure their own content; a leaf with none collapses to zero.
        let mut measure_fn = |known_dimensions: TaffySize<Option<f32>>,
                              available_space: TaffySize<AvailableSpace>,
                              _node_id: NodeId,
                              context: Option<&mut ViewId>,
                              _style: &Style| {
            let Some(&mut view) = context else {
                return TaffySize::ZERO;
            };
            let measures_content = tree
                .metadata(view)
                .is_some_and(|meta| meta.flags.contains(ViewFlags::MEASURES_CONTENT));
            if !measures_content {
                return TaffySize::ZERO;
            }
            let bounds = Size::new(
                known_dimensions
                    .width
                    .unwrap_or_else(|| from_available_space(available_space.width)),
                known_dimensions
                    .height
                    .unwrap_or_else(|| from_available_space(available_space.height)),
            );
            let content = tree
                .view(view)
                .and_then(|native| native.intrinsic_size(bounds))
                .unwrap_or(Size::ZERO)
                .normalized();
            TaffySize {
                width: known_dimensions.width.unwrap_or(content.width),
                height: known_dimensions.height.unwrap_or(content.height),
            }
        };

        self.taffy
            .compute_layout_with_measure(root_node, available_space, &mut measure_fn)?;
        self.root = Some(root);

        let layout = self.taffy.layout(root_node)?;
        Ok(Size::new(layout.size.width, layout.size.height))
    }

    fn arrange(
        &mut self,
        tree: &mut ViewTree,
        root: ViewId,
        animator: Option<&LayoutAnimator>,
    ) -> Result<(), LayoutError> {
        if self.root != Some(root) {
            return Err(LayoutError::NotMeasured(root));
        }

        for &(view, node) in &self.nodes {
            let layout = self.taffy.layout(node)?;
            let frame = Frame::new(
                layout.location.x,
                layout.location.y,
                layout.size.width,
                layout.size.height,
            );
            let written = match animator {
                Some(animator) => tree.animate_frame(view, frame, animator),
                None => tree.set_frame(view, frame),
            };
            if written.is_err() {
                return Err(LayoutError::MissingView(view));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NativeView;
    use crate::layout::text_measure::{measure_text_height, string_width};

    struct Panel;

    impl NativeView for Panel {}

    struct Text(&'static str);

    impl NativeView for Text {
        fn intrinsic_size(&self, available: Size) -> Option<Size> {
            let width = available.width.min(string_width(self.0) as f32);
            let height = measure_text_height(self.0, width.max(1.0) as u16);
            Some(Size::new(width, height as f32))
        }
    }

    fn setup() -> (ViewTree, TaffySolver) {
        (ViewTree::new(), TaffySolver::new())
    }

    fn panel(tree: &mut ViewTree, parent: Option<ViewId>, style: impl FnOnce(&mut FlexStyle)) -> ViewId {
        let id = tree.create(Panel);
        style(&mut tree.metadata_mut(id).unwrap().layout);
        if let Some(parent) = parent {
            tree.add_subview(parent, id).unwrap();
        }
        id
    }

    fn solve(tree: &mut ViewTree, solver: &mut TaffySolver, root: ViewId, available: Size) {
        solver.measure(tree, root, available).unwrap();
        solver.arrange(tree, root, None).unwrap();
    }

    #[test]
    fn test_single_root() {
        let (mut tree, mut solver) = setup();
        let root = panel(&mut tree, None, |s| s.set_size(40.0, 10.0));

        solve(&mut tree, &mut solver, root, Size::new(80.0, 24.0));
        assert_eq!(tree.frame(root), Some(Frame::new(0.0, 0.0, 40.0, 10.0)));
    }

    #[test]
    fn test_parent_child() {
        let (mut tree, mut solver) = setup();
        let parent = panel(&mut tree, None, |s| s.set_size(40.0, 10.0));
        let child = panel(&mut tree, Some(parent), |s| s.set_size(20.0, 5.0));

        solve(&mut tree, &mut solver, parent, Size::new(80.0, 24.0));
        assert_eq!(tree.frame(child), Some(Frame::new(0.0, 0.0, 20.0, 5.0)));
    }

    #[test]
    fn test_flex_row() {
        let (mut tree, mut solver) = setup();
        let parent = panel(&mut tree, None, |s| {
            s.set_size(40.0, 10.0);
            s.flex_direction = FlexDirection::Row;
        });
        let first = panel(&mut tree, Some(parent), |s| s.set_size(10.0, 5.0));
        let second = panel(&mut tree, Some(parent), |s| s.set_size(10.0, 5.0));

        solve(&mut tree, &mut solver, parent, Size::new(80.0, 24.0));
        assert_eq!(tree.frame(first).unwrap().origin.x, 0.0);
        assert_eq!(tree.frame(second).unwrap().origin.x, 10.0);
    }

    #[test]
    fn test_flex_grow() {
        let (mut tree, mut solver) = setup();
        let parent = panel(&mut tree, None, |s| {
            s.set_size(100.0, 10.0);
            s.flex_direction = FlexDirection::Row;
        });
        let child = panel(&mut tree, Some(parent), |s| {
            s.flex_grow = 1.0;
            s.height = Dimension::Points(5.0);
        });

        solve(&mut tree, &mut solver, parent, Size::new(80.0, 24.0));
        assert_eq!(tree.frame(child).unwrap().size.width, 100.0);
    }

    #[test]
    fn test_padding_and_border() {
        let (mut tree, mut solver) = setup();
        let parent = panel(&mut tree, None, |s| {
            s.set_size(40.0, 10.0);
            s.padding.left = 2.0;
            s.padding.top = 1.0;
            s.border.left = 1.0;
        });
        let child = panel(&mut tree, Some(parent), |s| s.set_size(10.0, 5.0));

        solve(&mut tree, &mut solver, parent, Size::new(80.0, 24.0));
        let origin = tree.frame(child).unwrap().origin;
        assert_eq!(origin.x, 3.0);
        assert_eq!(origin.y, 1.0);
    }

    #[test]
    fn test_justify_content_center() {
        let (mut tree, mut solver) = setup();
        let parent = panel(&mut tree, None, |s| {
            s.set_size(100.0, 10.0);
            s.flex_direction = FlexDirection::Row;
            s.justify_content = JustifyContent::Center;
        });
        let child = panel(&mut tree, Some(parent), |s| s.set_size(20.0, 5.0));

        solve(&mut tree, &mut solver, parent, Size::new(80.0, 24.0));
        assert_eq!(tree.frame(child).unwrap().origin.x, 40.0);
    }

    #[test]
    fn test_leaf_without_content_flag_measures_zero() {
        let (mut tree, mut solver) = setup();
        let parent = panel(&mut tree, None, |s| {
            s.set_size(40.0, 10.0);
            s.align_items = AlignItems::FlexStart;
        });
        let text = tree.create(Text("hello"));
        tree.add_subview(parent, text).unwrap();

        solve(&mut tree, &mut solver, parent, Size::new(80.0, 24.0));
        assert_eq!(tree.frame(text).unwrap().size, Size::ZERO);

        tree.metadata_mut(text).unwrap().flags.insert(ViewFlags::MEASURES_CONTENT);
        solve(&mut tree, &mut solver, parent, Size::new(80.0, 24.0));
        assert_eq!(tree.frame(text).unwrap().size, Size::new(5.0, 1.0));
    }

    #[test]
    fn test_arrange_requires_measure() {
        let (mut tree, mut solver) = setup();
        let root = panel(&mut tree, None, |_| {});
        assert!(matches!(
            solver.arrange(&mut tree, root, None),
            Err(LayoutError::NotMeasured(_))
        ));
    }

    #[test]
    fn test_dimension_conversion() {
        assert!(matches!(to_taffy_dimension(Dimension::Auto), TaffyDimension::Auto));
        assert!(matches!(to_taffy_dimension(Dimension::Points(50.0)), TaffyDimension::Length(50.0)));
        if let TaffyDimension::Percent(p) = to_taffy_dimension(Dimension::Percent(50.0)) {
            assert!((p - 0.5).abs() < 0.001);
        } else {
            panic!("Expected Percent variant");
        }
    }

    #[test]
    fn test_unbounded_axis_maps_to_max_content() {
        assert!(matches!(to_available_space(f32::INFINITY), AvailableSpace::MaxContent));
        assert!(matches!(to_available_space(12.0), AvailableSpace::Definite(12.0)));
        assert_eq!(from_available_space(AvailableSpace::MaxContent), f32::INFINITY);
    }
}
