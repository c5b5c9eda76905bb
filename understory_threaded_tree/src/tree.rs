// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: node slots, structure, and structural edits.

use alloc::{vec, vec::Vec};
use kurbo::Point;
use tracing::debug;

use crate::error::TreeError;
use crate::traversal::PlaybackState;
use crate::types::{NodeId, Side, ThreadLinks, Threading};

/// An editable binary tree with thread links.
///
/// The tree always has a root, created together with the tree and never
/// removable. Nodes are added one child slot at a time with [`Tree::add_child`]
/// and removed a whole subtree at a time with [`Tree::remove_subtree`].
///
/// Every structural edit:
/// - clears all `prev`/`next` links and marks an applied threading as
///   [`Threading::Stale`] (see [`Tree::refresh_threading`]),
/// - cancels any traversal in flight (see [`Tree::start_traversal`]).
///
/// Positions written by [`Tree::layout`] are not updated by edits; call it
/// again after changing the shape.
///
/// ## Example
///
/// ```rust
/// use understory_threaded_tree::{Side, Tree, TreeError};
///
/// let mut tree = Tree::new();
/// let root = tree.root();
/// let left = tree.add_child(root, Side::Left).unwrap();
///
/// assert_eq!(tree.parent_of(left), Some(root));
/// assert_eq!(
///     tree.add_child(root, Side::Left),
///     Err(TreeError::SlotOccupied { node: root, side: Side::Left })
/// );
/// assert_eq!(tree.remove_subtree(root), Err(TreeError::RootRemovalForbidden));
/// ```
pub struct Tree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: NodeId,
    len: usize,
    pub(crate) threading: Threading,
    pub(crate) playback: PlaybackState,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tree")
            .field("nodes_total", &self.nodes.len())
            .field("nodes_alive", &self.len)
            .field("free_list", &self.free_list.len())
            .field("root", &self.root)
            .field("threading", &self.threading)
            .field("playback", &self.playback)
            .finish_non_exhaustive()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    generation: u32,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) links: ThreadLinks,
    pub(crate) position: Option<Point>,
}

impl Node {
    fn new(generation: u32, parent: Option<NodeId>) -> Self {
        Self {
            generation,
            parent,
            left: None,
            right: None,
            links: ThreadLinks::NONE,
            position: None,
        }
    }

    fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    fn child_mut(&mut self, side: Side) -> &mut Option<NodeId> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

impl Tree {
    /// Create a tree holding only an empty root node.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: NodeId::new(0, 0),
            len: 0,
            threading: Threading::Off,
            playback: PlaybackState::default(),
        };
        tree.root = tree.alloc(None);
        tree
    }

    /// The root node. It lives as long as the tree.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.len
    }

    /// A tree is never empty: the root always exists.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Returns true if `id` is the root. Stale identifiers are never the root.
    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root
    }

    /// Returns true if `id` is live and has neither child.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.node_opt(id)
            .is_some_and(|n| n.left.is_none() && n.right.is_none())
    }

    /// Returns the parent of a node if live, or `None` for the root or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Returns the child in the given slot, if any.
    pub fn child_of(&self, id: NodeId, side: Side) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.child(side))
    }

    /// Returns the left child, if any.
    pub fn left_of(&self, id: NodeId) -> Option<NodeId> {
        self.child_of(id, Side::Left)
    }

    /// Returns the right child, if any.
    pub fn right_of(&self, id: NodeId) -> Option<NodeId> {
        self.child_of(id, Side::Right)
    }

    /// Iterate the existing children of a node, left before right.
    ///
    /// Yields nothing for stale identifiers.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let (left, right) = self
            .node_opt(id)
            .map_or((None, None), |n| (n.left, n.right));
        left.into_iter().chain(right)
    }

    /// Which slot of its parent a node occupies, or `None` for the root or stale ids.
    pub fn side_of(&self, id: NodeId) -> Option<Side> {
        let parent = self.parent_of(id)?;
        if self.left_of(parent) == Some(id) {
            Some(Side::Left)
        } else {
            Some(Side::Right)
        }
    }

    /// Thread links of a live node.
    ///
    /// Links are only meaningful while [`Tree::threading`] is
    /// [`Threading::Applied`]; edits clear them.
    pub fn thread_links(&self, id: NodeId) -> Option<ThreadLinks> {
        self.node_opt(id).map(|n| n.links)
    }

    /// Position assigned by the last [`Tree::layout`], if the node existed then.
    pub fn position(&self, id: NodeId) -> Option<Point> {
        self.node_opt(id).and_then(|n| n.position)
    }

    /// Create an empty child of `node` in the given slot.
    ///
    /// Fails with [`TreeError::SlotOccupied`] if the slot already holds a node.
    pub fn add_child(&mut self, node: NodeId, side: Side) -> Result<NodeId, TreeError> {
        let parent = self.node_opt(node).ok_or(TreeError::StaleNode(node))?;
        if parent.child(side).is_some() {
            return Err(TreeError::SlotOccupied { node, side });
        }
        let child = self.alloc(Some(node));
        *self.node_mut(node).child_mut(side) = Some(child);
        debug!(parent = ?node, ?side, ?child, "child added");
        self.structure_changed();
        Ok(child)
    }

    /// Detach `node` from its parent and release it together with all of its descendants.
    ///
    /// Fails with [`TreeError::RootRemovalForbidden`] for the root. Identifiers
    /// of every removed node become stale.
    pub fn remove_subtree(&mut self, node: NodeId) -> Result<(), TreeError> {
        if !self.is_alive(node) {
            return Err(TreeError::StaleNode(node));
        }
        if self.is_root(node) {
            return Err(TreeError::RootRemovalForbidden);
        }
        let removed = self.detach_and_free(node);
        debug!(?node, removed, "subtree removed");
        self.structure_changed();
        Ok(())
    }

    /// Remove `node` only if it is a leaf.
    ///
    /// Fails with [`TreeError::HasChildren`] otherwise, leaving the tree untouched;
    /// use [`Tree::remove_subtree`] to drop a node together with its children.
    pub fn try_remove_leaf(&mut self, node: NodeId) -> Result<(), TreeError> {
        if self.is_alive(node) && !self.is_root(node) && !self.is_leaf(node) {
            return Err(TreeError::HasChildren(node));
        }
        self.remove_subtree(node)
    }

    // --- internals ---

    pub(crate) fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    /// Access a node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    pub(crate) fn live_nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut().flatten()
    }

    fn alloc(&mut self, parent: Option<NodeId>) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, parent));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, parent)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        self.len += 1;
        NodeId::new(idx, generation)
    }

    /// Unlink `id` from its parent and free its subtree. Returns the number of freed slots.
    fn detach_and_free(&mut self, id: NodeId) -> usize {
        if let Some(parent) = self.parent_of(id) {
            let p = self.node_mut(parent);
            if p.left == Some(id) {
                p.left = None;
            } else if p.right == Some(id) {
                p.right = None;
            }
        }

        // Subtrees may be deep chains, so free them with an explicit stack.
        let mut stack = vec![id];
        let mut freed = 0;
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes[id.idx()].take() else {
                unreachable!("subtree slots are live until freed here");
            };
            stack.extend(node.left);
            stack.extend(node.right);
            self.free_list.push(id.idx());
            freed += 1;
        }
        self.len -= freed;
        freed
    }

    /// Invalidate everything derived from the tree shape.
    fn structure_changed(&mut self) {
        for node in self.live_nodes_mut() {
            node.links = ThreadLinks::NONE;
        }
        if let Threading::Applied(order) = self.threading {
            debug!(?order, "threading is stale");
            self.threading = Threading::Stale(order);
        }
        self.playback.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn new_tree_has_a_lone_root() {
        let tree = Tree::new();
        let root = tree.root();
        assert!(tree.is_alive(root));
        assert!(tree.is_root(root));
        assert!(tree.is_leaf(root));
        assert_eq!(tree.parent_of(root), None);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn add_child_links_both_directions() {
        let mut tree = Tree::new();
        let root = tree.root();
        let l = tree.add_child(root, Side::Left).unwrap();
        let r = tree.add_child(root, Side::Right).unwrap();

        assert_eq!(tree.left_of(root), Some(l));
        assert_eq!(tree.right_of(root), Some(r));
        assert_eq!(tree.parent_of(l), Some(root));
        assert_eq!(tree.parent_of(r), Some(root));
        assert_eq!(tree.side_of(l), Some(Side::Left));
        assert_eq!(tree.side_of(r), Some(Side::Right));
        assert_eq!(tree.side_of(root), None);
        assert!(!tree.is_leaf(root));
        assert!(!tree.is_root(l));
        assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![l, r]);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn occupied_slot_is_rejected_without_changes() {
        let mut tree = Tree::new();
        let root = tree.root();
        let r = tree.add_child(root, Side::Right).unwrap();
        let err = tree.add_child(root, Side::Right).unwrap_err();
        assert_eq!(
            err,
            TreeError::SlotOccupied {
                node: root,
                side: Side::Right
            }
        );
        assert_eq!(tree.right_of(root), Some(r), "existing child must be kept");
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn root_removal_is_forbidden() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.add_child(root, Side::Left).unwrap();
        assert_eq!(
            tree.remove_subtree(root),
            Err(TreeError::RootRemovalForbidden)
        );
        assert_eq!(tree.try_remove_leaf(root), Err(TreeError::RootRemovalForbidden));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn remove_subtree_releases_descendants() {
        let mut tree = Tree::new();
        let root = tree.root();
        let l = tree.add_child(root, Side::Left).unwrap();
        let r = tree.add_child(root, Side::Right).unwrap();
        let ll = tree.add_child(l, Side::Left).unwrap();
        let lr = tree.add_child(l, Side::Right).unwrap();
        let lrl = tree.add_child(lr, Side::Left).unwrap();

        tree.remove_subtree(l).unwrap();

        for id in [l, ll, lr, lrl] {
            assert!(!tree.is_alive(id), "{id:?} should be stale");
        }
        assert!(tree.is_alive(r));
        assert_eq!(tree.left_of(root), None);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.remove_subtree(l), Err(TreeError::StaleNode(l)));
        assert_eq!(
            tree.add_child(ll, Side::Left),
            Err(TreeError::StaleNode(ll))
        );
    }

    #[test]
    fn freed_slots_are_reused_with_newer_generation() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.add_child(root, Side::Left).unwrap();
        tree.remove_subtree(a).unwrap();
        let b = tree.add_child(root, Side::Left).unwrap();

        assert!(tree.is_alive(b));
        assert!(!tree.is_alive(a));
        assert_eq!(a.0, b.0, "the single freed slot should be reused");
        assert!(b.1 > a.1, "generation must increase on reuse");
    }

    #[test]
    fn try_remove_leaf_refuses_inner_nodes() {
        let mut tree = Tree::new();
        let root = tree.root();
        let l = tree.add_child(root, Side::Left).unwrap();
        let ll = tree.add_child(l, Side::Left).unwrap();

        assert_eq!(tree.try_remove_leaf(l), Err(TreeError::HasChildren(l)));
        assert!(tree.is_alive(ll));

        tree.try_remove_leaf(ll).unwrap();
        assert!(tree.is_leaf(l));
        tree.try_remove_leaf(l).unwrap();
        assert!(tree.is_leaf(root));
    }

    #[test]
    fn deep_chain_removal() {
        let mut tree = Tree::new();
        let root = tree.root();
        let top = tree.add_child(root, Side::Right).unwrap();
        let mut tip = top;
        for i in 0..2_000 {
            let side = if i % 2 == 0 { Side::Left } else { Side::Right };
            tip = tree.add_child(tip, side).unwrap();
        }
        tree.remove_subtree(top).unwrap();
        assert!(!tree.is_alive(tip));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn accessors_respect_liveness() {
        let mut tree = Tree::new();
        let root = tree.root();
        let l = tree.add_child(root, Side::Left).unwrap();
        tree.remove_subtree(l).unwrap();

        assert!(!tree.is_leaf(l));
        assert_eq!(tree.parent_of(l), None);
        assert_eq!(tree.thread_links(l), None);
        assert_eq!(tree.position(l), None);
        assert_eq!(tree.children(l).count(), 0);
    }
}
