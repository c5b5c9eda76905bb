// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Threading: rewiring empty child slots into order links.

use alloc::vec::Vec;
use tracing::debug;

use crate::traversal::Walk;
use crate::tree::Tree;
use crate::types::{NodeId, Order, ThreadLinks, Threading};

impl Tree {
    /// Every live node in the given depth-first order.
    pub fn order_sequence(&self, order: Order) -> Vec<NodeId> {
        let mut walk = Walk::new(self.root(), order);
        let mut sequence = Vec::with_capacity(self.len());
        while let Some(node) = walk.next(self) {
            sequence.push(node);
        }
        sequence
    }

    /// Thread the tree with the given order, replacing any previous threading.
    ///
    /// A node with no left child gets `prev` set to its predecessor in `order`,
    /// and a node with no right child gets `next` set to its successor. The
    /// first node never gets `prev` and the last never gets `next`.
    ///
    /// Cancels any traversal in flight.
    pub fn apply_threading(&mut self, order: Order) {
        let sequence = self.order_sequence(order);
        for node in self.live_nodes_mut() {
            node.links = ThreadLinks::NONE;
        }
        for (i, &id) in sequence.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| sequence[p]);
            let next = sequence.get(i + 1).copied();
            let node = self.node_mut(id);
            if node.left.is_none() {
                node.links.prev = prev;
            }
            if node.right.is_none() {
                node.links.next = next;
            }
        }
        self.threading = Threading::Applied(order);
        debug!(?order, nodes = sequence.len(), "threading applied");
        self.playback.invalidate();
    }

    /// Re-apply a threading that went stale through an edit.
    ///
    /// Returns the order that is applied afterwards, if any. Does nothing
    /// when the threading is [`Threading::Off`] or already applied.
    pub fn refresh_threading(&mut self) -> Option<Order> {
        if let Threading::Stale(order) = self.threading {
            self.apply_threading(order);
        }
        self.threading.active()
    }

    /// Drop all thread links.
    ///
    /// Cancels any traversal in flight if links were present.
    pub fn clear_threading(&mut self) {
        if self.threading == Threading::Off {
            return;
        }
        for node in self.live_nodes_mut() {
            node.links = ThreadLinks::NONE;
        }
        self.threading = Threading::Off;
        debug!("threading cleared");
        self.playback.invalidate();
    }

    /// The current threading state.
    pub fn threading(&self) -> Threading {
        self.threading
    }

    /// Returns true if `id` starts the applied threaded order: its left slot
    /// is empty and carries no `prev` link.
    pub fn is_prev_boundary(&self, id: NodeId) -> bool {
        self.threading.active().is_some()
            && self
                .node_opt(id)
                .is_some_and(|n| n.left.is_none() && n.links.prev.is_none())
    }

    /// Returns true if `id` ends the applied threaded order: its right slot
    /// is empty and carries no `next` link.
    pub fn is_next_boundary(&self, id: NodeId) -> bool {
        self.threading.active().is_some()
            && self
                .node_opt(id)
                .is_some_and(|n| n.right.is_none() && n.links.next.is_none())
    }
}
