// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the threaded tree: node identifiers, child sides, and orders.

/// Identifier for a node in the tree (generational).
///
/// A `NodeId` stays valid until the node is removed. Removing a node bumps the
/// generation stored in its slot, so a stale identifier is detected instead of
/// silently aliasing whatever node reuses the slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Which child slot of a node an operation refers to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    /// The left child slot.
    Left,
    /// The right child slot.
    Right,
}

/// A depth-first visitation order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Order {
    /// Node, then left subtree, then right subtree.
    Pre,
    /// Left subtree, then node, then right subtree.
    In,
    /// Left subtree, then right subtree, then node.
    Post,
}

impl Order {
    /// All three orders, in the order they are usually presented.
    pub const ALL: [Self; 3] = [Self::Pre, Self::In, Self::Post];
}

/// What a traversal walks.
///
/// [`TraversalKind::Walk`] recurses over the child links. [`TraversalKind::Threaded`]
/// chases `left`/`right`/`prev`/`next`/`parent` without a stack, using whichever
/// order the tree is currently threaded with.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TraversalKind {
    /// Recursive walk in the given order.
    Walk(Order),
    /// Pointer-chasing walk over the active threading.
    Threaded,
}

impl From<Order> for TraversalKind {
    fn from(order: Order) -> Self {
        Self::Walk(order)
    }
}

/// Threading state of a tree.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum Threading {
    /// No thread links are present.
    #[default]
    Off,
    /// Thread links reflect the given order for the current tree shape.
    Applied(Order),
    /// The tree was edited after threading with the given order; links were cleared.
    Stale(Order),
}

impl Threading {
    /// The order whose links are currently valid, if any.
    pub const fn active(self) -> Option<Order> {
        match self {
            Self::Applied(order) => Some(order),
            Self::Off | Self::Stale(_) => None,
        }
    }
}

/// Thread links of a single node.
///
/// `prev` can only be set when the node has no left child, and `next` only
/// when it has no right child.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct ThreadLinks {
    /// Predecessor in the threaded order.
    pub prev: Option<NodeId>,
    /// Successor in the threaded order.
    pub next: Option<NodeId>,
}

impl ThreadLinks {
    pub(crate) const NONE: Self = Self {
        prev: None,
        next: None,
    };
}
