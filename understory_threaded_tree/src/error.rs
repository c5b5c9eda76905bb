// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by structural edits and traversal requests.

use crate::types::{NodeId, Side};

/// A rejected tree operation.
///
/// None of these are fatal: the tree is left exactly as it was before the call.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// The requested child slot already holds a node.
    #[error("{side:?} child of {node:?} is already occupied")]
    SlotOccupied {
        /// Node whose slot was requested.
        node: NodeId,
        /// The occupied slot.
        side: Side,
    },
    /// The root can not be removed.
    #[error("the root node can not be removed")]
    RootRemovalForbidden,
    /// A threaded traversal was requested while no threading is applied.
    #[error("a threaded traversal needs an applied threading order")]
    ThreadingRequired,
    /// The identifier refers to a node that has been removed.
    #[error("{0:?} refers to a removed node")]
    StaleNode(NodeId),
    /// A leaf-only removal was attempted on a node with children.
    #[error("{0:?} still has children")]
    HasChildren(NodeId),
}
