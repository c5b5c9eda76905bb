// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row layout: breadth-first leveling and evenly spaced coordinates.

use alloc::{vec, vec::Vec};
use hashbrown::HashMap;
use kurbo::{Point, Size};
use tracing::debug;

use crate::tree::Tree;
use crate::types::NodeId;

/// Knobs for [`compute`] and [`Tree::layout`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOptions {
    /// Node radius as a fraction of the smallest cell (the narrowest of a column
    /// in the widest row and a row). Defaults to `0.3`.
    pub radius_scale: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self { radius_scale: 0.3 }
    }
}

impl LayoutOptions {
    /// Set the node radius scale.
    pub fn with_radius_scale(mut self, radius_scale: f64) -> Self {
        self.radius_scale = radius_scale;
        self
    }
}

/// Result of a layout pass.
///
/// Row 0 holds the root; row `k + 1` holds, left to right, the children of
/// the nodes in row `k`. Each node sits centered in an equal share of its row's
/// width, and rows share the height equally. A layout is a snapshot: edits to
/// the tree do not update it.
#[derive(Clone, Debug)]
pub struct Layout {
    rows: Vec<Vec<NodeId>>,
    positions: HashMap<NodeId, Point>,
    leaf_count: usize,
    node_radius: f64,
    surface: Size,
}

impl Layout {
    /// Nodes grouped by depth, each row in left-to-right order.
    pub fn rows(&self) -> &[Vec<NodeId>] {
        &self.rows
    }

    /// Number of rows (the height of the tree in nodes).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Length of the widest row.
    pub fn max_row_len(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Total number of laid out nodes.
    pub fn node_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Number of nodes without children.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Radius shared by every node.
    pub fn node_radius(&self) -> f64 {
        self.node_radius
    }

    /// The surface size this layout was computed for.
    pub fn surface(&self) -> Size {
        self.surface
    }

    /// Center of a node, if it was part of this layout.
    pub fn position(&self, id: NodeId) -> Option<Point> {
        self.positions.get(&id).copied()
    }

    /// Leaves in row order, for example to highlight them.
    ///
    /// Leaf status is read from `tree`, so this reflects edits made after the
    /// layout was computed only as far as the laid out nodes go.
    pub fn leaves<'a>(&'a self, tree: &'a Tree) -> impl Iterator<Item = NodeId> + 'a {
        self.rows
            .iter()
            .flatten()
            .copied()
            .filter(move |&id| tree.is_leaf(id))
    }
}

/// Compute the row decomposition and node positions for a surface.
///
/// This is a pure function of the tree shape, `surface`, and `options`.
pub fn compute(tree: &Tree, surface: Size, options: LayoutOptions) -> Layout {
    let mut rows = vec![vec![tree.root()]];
    let mut leaf_count = 0;
    let mut current = 0;
    while current < rows.len() {
        let mut next_row = Vec::new();
        for &node in &rows[current] {
            if tree.is_leaf(node) {
                leaf_count += 1;
            } else {
                next_row.extend(tree.children(node));
            }
        }
        if !next_row.is_empty() {
            rows.push(next_row);
        }
        current += 1;
    }

    let row_count = rows.len() as f64;
    let max_row_len = rows.iter().map(Vec::len).max().unwrap_or(1) as f64;
    let row_height = surface.height / row_count;
    let node_radius = (surface.width / max_row_len).min(row_height) * options.radius_scale;

    let mut positions = HashMap::with_capacity(rows.iter().map(Vec::len).sum());
    for (r, row) in rows.iter().enumerate() {
        let column_width = surface.width / row.len() as f64;
        let y = row_height * (r as f64 + 0.5);
        for (c, &id) in row.iter().enumerate() {
            positions.insert(id, Point::new(column_width * (c as f64 + 0.5), y));
        }
    }

    Layout {
        rows,
        positions,
        leaf_count,
        node_radius,
        surface,
    }
}

impl Tree {
    /// Lay the tree out on a surface and store each node's position.
    ///
    /// See [`compute`] for the geometry. Positions are readable afterwards via
    /// [`Tree::position`]. Nodes added later have no position until the next
    /// call.
    pub fn layout(&mut self, surface: Size, options: LayoutOptions) -> Layout {
        let layout = compute(self, surface, options);
        for (&id, &point) in &layout.positions {
            self.node_mut(id).position = Some(point);
        }
        debug!(
            rows = layout.row_count(),
            nodes = layout.node_count(),
            leaves = layout.leaf_count,
            "layout computed"
        );
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;
    use alloc::vec;

    fn scenario() -> (Tree, [NodeId; 4]) {
        let mut tree = Tree::new();
        let root = tree.root();
        let l = tree.add_child(root, Side::Left).unwrap();
        let r = tree.add_child(root, Side::Right).unwrap();
        let rr = tree.add_child(r, Side::Right).unwrap();
        (tree, [root, l, r, rr])
    }

    fn assert_close(actual: f64, expected: f64) {
        let delta = actual - expected;
        assert!(
            -1e-9 < delta && delta < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn single_root_fills_the_surface() {
        let tree = Tree::new();
        let layout = compute(&tree, Size::new(100.0, 60.0), LayoutOptions::default());
        assert_eq!(layout.rows(), &[vec![tree.root()]]);
        assert_eq!(layout.leaf_count(), 1);
        assert_eq!(layout.position(tree.root()), Some(Point::new(50.0, 30.0)));
        assert_close(layout.node_radius(), 18.0);
    }

    #[test]
    fn rows_are_breadth_first_left_to_right() {
        let (tree, [root, l, r, rr]) = scenario();
        let layout = compute(&tree, Size::new(400.0, 300.0), LayoutOptions::default());
        assert_eq!(layout.rows(), &[vec![root], vec![l, r], vec![rr]]);
        assert_eq!(layout.node_count(), tree.len());
        assert_eq!(layout.leaf_count(), 2);
        assert_eq!(layout.leaves(&tree).collect::<Vec<_>>(), vec![l, rr]);
    }

    #[test]
    fn coordinates_center_nodes_in_their_slots() {
        let (tree, [root, l, r, rr]) = scenario();
        let layout = compute(&tree, Size::new(400.0, 300.0), LayoutOptions::default());
        assert_eq!(layout.position(root), Some(Point::new(200.0, 50.0)));
        assert_eq!(layout.position(l), Some(Point::new(100.0, 150.0)));
        assert_eq!(layout.position(r), Some(Point::new(300.0, 150.0)));
        assert_eq!(layout.position(rr), Some(Point::new(200.0, 250.0)));
        // min(400 / 2, 300 / 3) * 0.3
        assert_close(layout.node_radius(), 30.0);
    }

    #[test]
    fn radius_scale_is_configurable() {
        let (tree, _) = scenario();
        let options = LayoutOptions::default().with_radius_scale(0.5);
        let layout = compute(&tree, Size::new(400.0, 300.0), options);
        assert_close(layout.node_radius(), 50.0);
    }

    #[test]
    fn children_of_leafless_rows_keep_their_order() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.add_child(root, Side::Left).unwrap();
        let b = tree.add_child(root, Side::Right).unwrap();
        let ar = tree.add_child(a, Side::Right).unwrap();
        let bl = tree.add_child(b, Side::Left).unwrap();
        let br = tree.add_child(b, Side::Right).unwrap();
        let layout = compute(&tree, Size::new(300.0, 300.0), LayoutOptions::default());
        assert_eq!(layout.rows()[2], vec![ar, bl, br]);
        assert_eq!(layout.max_row_len(), 3);
        assert_eq!(layout.leaf_count(), 3);
    }

    #[test]
    fn compute_is_repeatable() {
        let (tree, ids) = scenario();
        let surface = Size::new(640.0, 480.0);
        let a = compute(&tree, surface, LayoutOptions::default());
        let b = compute(&tree, surface, LayoutOptions::default());
        assert_eq!(a.rows(), b.rows());
        for id in ids {
            assert_eq!(a.position(id), b.position(id));
        }
    }

    #[test]
    fn tree_layout_stores_positions() {
        let (mut tree, [root, l, ..]) = scenario();
        assert_eq!(tree.position(root), None);
        let layout = tree.layout(Size::new(400.0, 300.0), LayoutOptions::default());
        assert_eq!(tree.position(root), layout.position(root));
        assert_eq!(tree.position(l), Some(Point::new(100.0, 150.0)));

        let added = tree.add_child(l, Side::Left).unwrap();
        assert_eq!(tree.position(added), None, "new nodes wait for the next layout");
    }

    #[test]
    fn layout_does_not_cancel_traversals() {
        let (mut tree, _) = scenario();
        let generation = tree.generation();
        tree.layout(Size::new(10.0, 10.0), LayoutOptions::default());
        assert_eq!(tree.generation(), generation);
    }
}
