//! Reconciler - Node tree diffing onto the native view tree.
//!
//! One [`Reconciler`] runs one pass, in phases:
//!
//! ```text
//! diff ──▶ will_layout ──▶ configure ──▶ layout ──▶ did_layout ──▶ finish
//!  │                          │             │            │
//!  reuse/create/remove        bindings      two-pass     view refs, on_mount,
//!  native views               diff          measure      did_layout callbacks
//! ```
//!
//! Callbacks run between phases, without the view tree borrowed, so they may
//! inspect it.
//!
//! # Matching
//!
//! Children are matched against the parent view's node-managed subviews in
//! declaration order. A child takes the first candidate whose reuse tag and
//! instance key both match; unmatched children get a new view and unclaimed
//! candidates are removed. Unkeyed siblings are keyed by ordinal, so
//! reordering them hands views to different nodes: give list items stable
//! keys.

use std::collections::HashSet;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::binding::{BindingSet, BindingStats};
use super::component::RenderOptions;
use super::node::{ConfigureInput, Node};
use crate::host::{ViewFlags, ViewId, ViewParts, ViewTree};
use crate::layout::{layout_two_pass, FlexStyle, LayoutAnimator, LayoutSolver};
use crate::style::StyleSheet;
use crate::types::{Dimension, Size};

/// What one pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    /// Views created for nodes without a reusable candidate.
    pub created: usize,
    pub reused: usize,
    /// Views removed because no node claimed them (subtrees count once).
    pub removed: usize,
    /// Reused views moved to their node's index.
    pub moved: usize,
    pub bindings: BindingStats,
    pub elapsed: Duration,
}

impl ReconcileReport {
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// No views were created, removed or moved.
    pub fn is_structurally_stable(&self) -> bool {
        self.created == 0 && self.removed == 0 && self.moved == 0
    }
}

/// Single-pass reconciliation of a node tree under a canvas view.
pub struct Reconciler {
    options: RenderOptions,
    stylesheet: Option<Rc<dyn StyleSheet>>,
    animator: Option<LayoutAnimator>,
    skip_redundant_measure: bool,
    report: ReconcileReport,
    mounted: HashSet<ViewId>,
    started: Instant,
}

impl Reconciler {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            stylesheet: None,
            animator: None,
            skip_redundant_measure: false,
            report: ReconcileReport::default(),
            mounted: HashSet::new(),
            started: Instant::now(),
        }
    }

    pub fn with_stylesheet(mut self, stylesheet: Option<Rc<dyn StyleSheet>>) -> Self {
        self.stylesheet = stylesheet;
        self
    }

    /// Animate frame changes of this pass.
    pub fn with_animator(mut self, animator: Option<LayoutAnimator>) -> Self {
        self.animator = animator;
        self
    }

    pub fn skip_redundant_measure(mut self, skip: bool) -> Self {
        self.skip_redundant_measure = skip;
        self
    }

    /// All phases against a tree the caller already holds.
    ///
    /// Node callbacks run while `tree` is borrowed here; use the phase
    /// methods directly when callbacks need the tree.
    pub fn render(
        mut self,
        tree: &mut ViewTree,
        solver: &mut dyn LayoutSolver,
        root: &mut Node,
        canvas: ViewId,
        available: Size,
    ) -> ReconcileReport {
        self.diff(tree, root, canvas);
        self.will_layout(root);
        self.configure(tree, root, available);
        self.layout(tree, solver, root, available);
        self.did_layout(root);
        self.finish()
    }

    // =========================================================================
    // Diff
    // =========================================================================

    /// Bind every node to a view, creating and removing views as needed.
    pub fn diff(&mut self, tree: &mut ViewTree, root: &mut Node, canvas: ViewId) {
        if !tree.contains(canvas) {
            panic!("canvas view {canvas:?} is not in the view tree");
        }

        let roots = std::slice::from_mut(root);
        if self.options.contains(RenderOptions::SUPPRESS_DIFF) {
            if self.bind_static(tree, canvas, roots) {
                self.mark_reused(tree, roots);
                return;
            }
            log::warn!(
                "static render does not match the hierarchy under {canvas:?}; running a full diff"
            );
        }

        self.reconcile_children(tree, canvas, roots);
    }

    fn reconcile_children(&mut self, tree: &mut ViewTree, parent: ViewId, children: &mut [Node]) {
        let mut candidates = tree.node_subviews(parent);

        let claimed: Vec<Option<ViewId>> = children
            .iter()
            .map(|child| {
                candidates
                    .iter()
                    .position(|&view| {
                        tree.metadata(view).is_some_and(|meta| meta.matches(child.key()))
                    })
                    .map(|position| candidates.remove(position))
            })
            .collect();

        // Leftovers go before placement; positions below are among survivors.
        for stale in candidates {
            self.remove(tree, stale);
        }

        for (child, candidate) in children.iter_mut().zip(claimed) {
            self.reconcile_node(tree, child, candidate, parent);
        }
    }

    fn reconcile_node(
        &mut self,
        tree: &mut ViewTree,
        node: &mut Node,
        candidate: Option<ViewId>,
        parent: ViewId,
    ) {
        let reusable = candidate
            .filter(|&view| tree.metadata(view).is_some_and(|meta| meta.matches(node.key())));

        let view = match reusable {
            Some(view) => {
                tree.flush_gestures(view);
                if let Some(meta) = tree.metadata_mut(view) {
                    meta.flags.remove(ViewFlags::NEWLY_CREATED);
                }
                if tree.index_in_parent(view) != Some(node.index()) {
                    self.insert(tree, parent, view, node.index());
                    self.report.moved += 1;
                }
                self.report.reused += 1;
                view
            }
            None => {
                if let Some(stale) = candidate {
                    self.remove(tree, stale);
                }
                let view = tree.create_boxed(node.create_view());
                if let Some(meta) = tree.metadata_mut(view) {
                    meta.adopt(node.key());
                    meta.flags.insert(ViewFlags::NEWLY_CREATED);
                }
                self.insert(tree, parent, view, node.index());
                self.mounted.insert(view);
                self.report.created += 1;
                view
            }
        };

        node.bind(view);
        self.reconcile_children(tree, view, node.children_mut());
    }

    fn insert(&self, tree: &mut ViewTree, parent: ViewId, view: ViewId, index: usize) {
        if let Err(err) = tree.insert_subview(parent, view, index) {
            log::warn!("could not place {view:?} under {parent:?}: {err}");
        }
    }

    fn remove(&mut self, tree: &mut ViewTree, view: ViewId) {
        match tree.remove_from_parent(view) {
            Ok(released) => {
                self.report.removed += 1;
                log::trace!("removed {view:?} ({released} views released)");
            }
            Err(err) => log::warn!("could not remove {view:?}: {err}"),
        }
    }

    /// Positional binding for `SUPPRESS_DIFF`. False if the existing
    /// hierarchy does not line up with the nodes.
    fn bind_static(&self, tree: &ViewTree, parent: ViewId, children: &mut [Node]) -> bool {
        let existing = tree.node_subviews(parent);
        if existing.len() != children.len() {
            return false;
        }

        for (child, &view) in children.iter_mut().zip(&existing) {
            if !tree.metadata(view).is_some_and(|meta| meta.matches(child.key())) {
                return false;
            }
            child.bind(view);
            if !self.bind_static(tree, view, child.children_mut()) {
                return false;
            }
        }
        true
    }

    fn mark_reused(&mut self, tree: &mut ViewTree, nodes: &[Node]) {
        for node in nodes {
            if let Some(meta) = node.view().and_then(|view| tree.metadata_mut(view)) {
                meta.flags.remove(ViewFlags::NEWLY_CREATED);
            }
            self.report.reused += 1;
            self.mark_reused(tree, node.children());
        }
    }

    // =========================================================================
    // Configure
    // =========================================================================

    /// Run configure closures parent-first and commit their bindings.
    pub fn configure(&mut self, tree: &mut ViewTree, root: &Node, available: Size) {
        self.configure_node(tree, root, available);
    }

    fn configure_node(&mut self, tree: &mut ViewTree, node: &Node, available: Size) {
        let view = resolved(node);
        let Some(ViewParts { view: native, meta, .. }) = tree.parts_mut(view) else {
            panic!("view {view:?} bound to node {} was released mid-pass", node.key());
        };

        native.reset_targets();
        if node.resets_before_reuse() && !meta.is_newly_created() {
            native.prepare_for_reuse();
        }
        meta.layout = FlexStyle::default();

        let mut bindings = BindingSet::new();
        node.run_configure(ConfigureInput {
            view: &*native,
            id: view,
            layout: &mut meta.layout,
            available,
            bindings: &mut bindings,
            style: self.stylesheet.as_deref(),
        });
        self.report.bindings += meta.render_context.commit(native, bindings);
        native.post_render();

        // Unsized leaves measure their content. Leaves without content
        // collapse along every axis they leave unsized.
        meta.flags.remove(ViewFlags::MEASURES_CONTENT);
        if node.children().is_empty() {
            if native.intrinsic_size(available).is_some() {
                if !meta.layout.has_explicit_size() {
                    meta.flags.insert(ViewFlags::MEASURES_CONTENT);
                }
            } else {
                if meta.layout.width.is_auto() {
                    meta.layout.width = Dimension::Points(0.0);
                }
                if meta.layout.height.is_auto() {
                    meta.layout.height = Dimension::Points(0.0);
                }
            }
        }

        for child in node.children() {
            self.configure_node(tree, child, available);
        }
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Two-pass measure and arrange of the root view.
    pub fn layout(
        &mut self,
        tree: &mut ViewTree,
        solver: &mut dyn LayoutSolver,
        root: &Node,
        available: Size,
    ) {
        let view = resolved(root);
        match layout_two_pass(
            solver,
            tree,
            view,
            available,
            self.skip_redundant_measure,
            self.animator.as_ref(),
        ) {
            Ok(size) => log::trace!("laid out {view:?} at {size:?}"),
            Err(err) => log::warn!("layout of {view:?} failed: {err}"),
        }
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    pub fn will_layout(&self, root: &Node) {
        if self.options.contains(RenderOptions::SUPPRESS_CALLBACKS) {
            return;
        }
        visit(root, &mut |node| {
            if let Some(view) = node.view() {
                node.notify_will_layout(view);
            }
        });
    }

    /// Publish view refs and component root views, then deliver `on_mount`
    /// and `did_layout`.
    pub fn did_layout(&self, root: &Node) {
        let callbacks = !self.options.contains(RenderOptions::SUPPRESS_CALLBACKS);
        visit(root, &mut |node| {
            let Some(view) = node.view() else { return };
            if let Some(slot) = node.view_ref() {
                slot.set(view);
            }
            if let Some(component) = node.associated_component() {
                component.bind_root_view(view);
            }
            if callbacks {
                if self.mounted.contains(&view) {
                    node.notify_mount(view);
                }
                node.notify_did_layout(view);
            }
        });
    }

    pub fn finish(self) -> ReconcileReport {
        let report = self.report.with_elapsed(self.started.elapsed());
        log::debug!(
            "reconciled: {} created, {} reused, {} removed, {} moved; bindings {:?}",
            report.created,
            report.reused,
            report.removed,
            report.moved,
            report.bindings
        );
        report
    }
}

fn resolved(node: &Node) -> ViewId {
    match node.view() {
        Some(view) => view,
        None => panic!("unresolved root view for node {}", node.key()),
    }
}

fn visit(node: &Node, f: &mut impl FnMut(&Node)) {
    f(node);
    for child in node.children() {
        visit(child, f);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::engine::{Node, ViewRef};
    use crate::layout::TaffySolver;
    use crate::primitives::{Container, Label};
    use crate::types::Frame;

    fn setup() -> (ViewTree, ViewId, TaffySolver) {
        let mut tree = ViewTree::new();
        let canvas = tree.create(Container::default());
        tree.set_frame(canvas, Frame::new(0.0, 0.0, 200.0, 400.0)).unwrap();
        (tree, canvas, TaffySolver::new())
    }

    fn render(tree: &mut ViewTree, solver: &mut TaffySolver, canvas: ViewId, mut root: Node) -> (Node, ReconcileReport) {
        render_with(tree, solver, canvas, &mut root, RenderOptions::empty());
        let report = render_with(tree, solver, canvas, &mut root, RenderOptions::empty());
        (root, report)
    }

    fn render_with(
        tree: &mut ViewTree,
        solver: &mut TaffySolver,
        canvas: ViewId,
        root: &mut Node,
        options: RenderOptions,
    ) -> ReconcileReport {
        Reconciler::new(options).render(tree, solver, root, canvas, Size::new(200.0, 400.0))
    }

    fn label(text: &str) -> Node {
        let text = text.to_string();
        Node::configured(Label::default, move |cfg| {
            cfg.set(Label::TEXT, text.clone());
        })
    }

    fn list(keys: &[usize]) -> Node {
        Node::new(Container::default)
            .with_key("list")
            .with_children(keys.iter().map(|i| label(&format!("cell {i}")).with_key(format!("cell-{i}"))))
    }

    #[test]
    fn test_first_pass_creates_everything() {
        let (mut tree, canvas, mut solver) = setup();
        let mut root = list(&[0, 1, 2]);

        let report = render_with(&mut tree, &mut solver, canvas, &mut root, RenderOptions::empty());

        assert_eq!(report.created, 4);
        assert_eq!(report.reused, 0);
        assert_eq!(tree.subviews(canvas).len(), 1);
        let list_view = root.view().unwrap();
        assert_eq!(tree.subviews(list_view).len(), 3);
        assert!(tree.metadata(list_view).unwrap().is_newly_created());
    }

    #[test]
    fn test_same_tree_is_idempotent() {
        let (mut tree, canvas, mut solver) = setup();
        let (root, report) = render(&mut tree, &mut solver, canvas, list(&[0, 1, 2]));

        assert!(report.is_structurally_stable());
        assert_eq!(report.reused, 4);
        assert_eq!(report.bindings.applied, 0);
        assert_eq!(report.bindings.skipped, 3);
        assert!(!tree.metadata(root.view().unwrap()).unwrap().is_newly_created());
    }

    #[test]
    fn test_removed_item_removes_its_view_only() {
        let (mut tree, canvas, mut solver) = setup();
        let mut first = list(&[0, 1, 2, 3, 4]);
        render_with(&mut tree, &mut solver, canvas, &mut first, RenderOptions::empty());
        let before: Vec<ViewId> = first.children().iter().filter_map(Node::view).collect();

        let mut second = list(&[0, 1, 2, 4]);
        let report = render_with(&mut tree, &mut solver, canvas, &mut second, RenderOptions::empty());

        assert_eq!(report.created, 0);
        assert_eq!(report.removed, 1);
        assert!(!tree.contains(before[3]));
        let after: Vec<ViewId> = second.children().iter().filter_map(Node::view).collect();
        assert_eq!(after, vec![before[0], before[1], before[2], before[4]]);
        assert_eq!(tree.subviews(second.view().unwrap()), after.as_slice());
    }

    #[test]
    fn test_removal_moves_no_siblings() {
        let (mut tree, canvas, mut solver) = setup();
        let mut first = list(&[0, 1, 2, 3, 4, 5, 6, 7]);
        render_with(&mut tree, &mut solver, canvas, &mut first, RenderOptions::empty());

        let mut second = list(&[0, 1, 2, 4, 5, 6, 7]);
        let report = render_with(&mut tree, &mut solver, canvas, &mut second, RenderOptions::empty());

        assert_eq!(report.created, 0);
        assert_eq!(report.removed, 1);
        assert_eq!(report.moved, 0);
    }

    #[test]
    fn test_insertion_moves_no_siblings() {
        let (mut tree, canvas, mut solver) = setup();
        let mut first = list(&[0, 1, 2]);
        render_with(&mut tree, &mut solver, canvas, &mut first, RenderOptions::empty());

        let mut second = list(&[0, 9, 1, 2]);
        let report = render_with(&mut tree, &mut solver, canvas, &mut second, RenderOptions::empty());

        assert_eq!(report.created, 1);
        assert_eq!(report.moved, 0);
        let after: Vec<ViewId> = second.children().iter().filter_map(Node::view).collect();
        assert_eq!(tree.subviews(second.view().unwrap()), after.as_slice());
    }

    #[test]
    fn test_reordered_keys_move_views() {
        let (mut tree, canvas, mut solver) = setup();
        let mut first = list(&[0, 1, 2]);
        render_with(&mut tree, &mut solver, canvas, &mut first, RenderOptions::empty());
        let before: Vec<ViewId> = first.children().iter().filter_map(Node::view).collect();

        let mut second = list(&[2, 0, 1]);
        let report = render_with(&mut tree, &mut solver, canvas, &mut second, RenderOptions::empty());

        assert_eq!(report.created, 0);
        assert!(report.moved > 0);
        let expected = vec![before[2], before[0], before[1]];
        assert_eq!(tree.subviews(second.view().unwrap()), expected.as_slice());
    }

    #[test]
    fn test_category_change_replaces_view() {
        let (mut tree, canvas, mut solver) = setup();
        let mut first = Node::new(Container::default).with_child(label("a"));
        render_with(&mut tree, &mut solver, canvas, &mut first, RenderOptions::empty());
        let old = first.children()[0].view().unwrap();

        let mut second = Node::new(Container::default).with_child(Node::new(Container::default));
        let report = render_with(&mut tree, &mut solver, canvas, &mut second, RenderOptions::empty());

        assert_eq!(report.created, 1);
        assert_eq!(report.removed, 1);
        assert!(!tree.contains(old));
    }

    #[test]
    fn test_unmanaged_subviews_are_left_alone() {
        let (mut tree, canvas, mut solver) = setup();
        let foreign = tree.create(Label::default());
        tree.add_subview(canvas, foreign).unwrap();

        let mut root = list(&[0]);
        render_with(&mut tree, &mut solver, canvas, &mut root, RenderOptions::empty());
        render_with(&mut tree, &mut solver, canvas, &mut list(&[]), RenderOptions::empty());

        assert!(tree.contains(foreign));
    }

    #[test]
    fn test_binding_restored_when_omitted() {
        let (mut tree, canvas, mut solver) = setup();
        let mut first = Node::new(Container::default).with_child(label("bound"));
        render_with(&mut tree, &mut solver, canvas, &mut first, RenderOptions::empty());
        let view = first.children()[0].view().unwrap();
        assert_eq!(tree.downcast::<Label>(view).unwrap().text(), "bound");

        let mut second = Node::new(Container::default).with_child(Node::new(Label::default));
        let report = render_with(&mut tree, &mut solver, canvas, &mut second, RenderOptions::empty());

        assert_eq!(report.bindings.restored, 1);
        assert_eq!(tree.downcast::<Label>(view).unwrap().text(), "");
    }

    #[test]
    fn test_static_mode_binds_positionally() {
        let (mut tree, canvas, mut solver) = setup();
        let mut first = list(&[0, 1]);
        render_with(&mut tree, &mut solver, canvas, &mut first, RenderOptions::empty());

        let mut second = list(&[0, 1]);
        let report = render_with(&mut tree, &mut solver, canvas, &mut second, RenderOptions::SUPPRESS_DIFF);

        assert_eq!(report.reused, 3);
        assert!(report.is_structurally_stable());
        assert_eq!(second.children()[1].view(), first.children()[1].view());
    }

    #[test]
    fn test_static_mode_falls_back_on_mismatch() {
        let (mut tree, canvas, mut solver) = setup();
        let mut first = list(&[0, 1]);
        render_with(&mut tree, &mut solver, canvas, &mut first, RenderOptions::empty());

        let mut second = list(&[0, 1, 2]);
        let report = render_with(&mut tree, &mut solver, canvas, &mut second, RenderOptions::SUPPRESS_DIFF);

        assert_eq!(report.created, 1);
        assert_eq!(tree.subviews(second.view().unwrap()).len(), 3);
    }

    #[test]
    fn test_empty_leaf_collapses() {
        let (mut tree, canvas, mut solver) = setup();
        let mut root = Node::new(Container::default).with_children([
            Node::new(Container::default),
            label("text"),
        ]);
        render_with(&mut tree, &mut solver, canvas, &mut root, RenderOptions::empty());

        let empty = root.children()[0].view().unwrap();
        let text = root.children()[1].view().unwrap();
        assert_eq!(tree.frame(empty).unwrap().size, Size::ZERO);
        assert!(tree.frame(text).unwrap().size.height > 0.0);
        assert!(!tree.metadata(empty).unwrap().flags.contains(ViewFlags::MEASURES_CONTENT));
        assert!(tree.metadata(text).unwrap().flags.contains(ViewFlags::MEASURES_CONTENT));
    }

    #[test]
    fn test_empty_leaf_keeps_its_sized_axis() {
        let (mut tree, canvas, mut solver) = setup();
        let mut root = Node::new(Container::default).with_child(
            Node::configured(Container::default, |cfg| {
                cfg.layout().width = Dimension::Points(50.0);
            }),
        );
        render_with(&mut tree, &mut solver, canvas, &mut root, RenderOptions::empty());

        let spacer = root.children()[0].view().unwrap();
        assert_eq!(tree.frame(spacer).unwrap().size, Size::new(50.0, 0.0));
    }

    #[test]
    fn test_callbacks_and_view_refs() {
        let (mut tree, canvas, mut solver) = setup();
        let mounts = Rc::new(Cell::new(0));
        let layouts = Rc::new(Cell::new(0));
        let slot = ViewRef::new();

        let build = || {
            let mounts = mounts.clone();
            let layouts = layouts.clone();
            Node::new(Container::default)
                .bind_view(&slot)
                .on_mount(move |_| mounts.set(mounts.get() + 1))
                .did_layout(move |_| layouts.set(layouts.get() + 1))
        };

        let mut first = build();
        render_with(&mut tree, &mut solver, canvas, &mut first, RenderOptions::empty());
        let mut second = build();
        render_with(&mut tree, &mut solver, canvas, &mut second, RenderOptions::empty());
        let mut third = build();
        render_with(&mut tree, &mut solver, canvas, &mut third, RenderOptions::SUPPRESS_CALLBACKS);

        assert_eq!(mounts.get(), 1);
        assert_eq!(layouts.get(), 2);
        assert_eq!(slot.get(), first.view());
    }

    #[test]
    fn test_configure_runs_parent_first() {
        let (mut tree, canvas, mut solver) = setup();
        let order = Rc::new(RefCell::new(Vec::new()));

        let parent_order = order.clone();
        let child_order = order.clone();
        let mut root = Node::configured(Container::default, move |_cfg| {
            parent_order.borrow_mut().push("parent");
        })
        .with_child(Node::configured(Container::default, move |_cfg| {
            child_order.borrow_mut().push("child");
        }));

        render_with(&mut tree, &mut solver, canvas, &mut root, RenderOptions::empty());
        assert_eq!(*order.borrow(), vec!["parent", "child"]);
    }

    #[test]
    #[should_panic(expected = "not in the view tree")]
    fn test_missing_canvas_panics() {
        let (mut tree, canvas, mut solver) = setup();
        tree.remove_from_parent(canvas).unwrap();
        render_with(&mut tree, &mut solver, canvas, &mut list(&[0]), RenderOptions::empty());
    }
}
