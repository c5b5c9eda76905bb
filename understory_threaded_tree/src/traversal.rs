// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cancellable traversals over a [`Tree`].
//!
//! A traversal is a [`Cursor`] that yields one node per call to
//! [`Cursor::advance`]. It does not borrow the tree between steps, so the
//! tree can be edited while a traversal is in flight. Every cursor captures
//! the tree's traversal generation when it starts; starting another traversal,
//! editing the tree, changing the threading, or calling
//! [`Tree::cancel_traversal`] bumps the generation, and the cursor stops at
//! its next step.

use core::cell::Cell;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::TreeError;
use crate::tree::Tree;
use crate::types::{NodeId, Order, TraversalKind};

/// Per-tree traversal bookkeeping.
#[derive(Debug, Default)]
pub(crate) struct PlaybackState {
    generation: u64,
    /// Only the traversal owning the current generation may clear this.
    active: Cell<bool>,
}

impl PlaybackState {
    /// Start a new generation with a traversal running.
    fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.active.set(true);
        self.generation
    }

    /// Start a new generation with nothing running.
    pub(crate) fn invalidate(&mut self) {
        self.generation += 1;
        if self.active.replace(false) {
            debug!(generation = self.generation, "traversal invalidated");
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    fn complete(&self, generation: u64) {
        if self.is_current(generation) {
            self.active.set(false);
        }
    }
}

/// One pending action of a recursive walk.
#[derive(Clone, Copy, Debug)]
enum Step {
    Visit(NodeId),
    Descend(NodeId),
}

/// A depth-first walk over the child links, stepped one visit at a time.
///
/// The explicit stack holds exactly what the call stack of the recursive
/// walk would: the remaining actions of every node on the current path.
#[derive(Clone, Debug)]
pub(crate) struct Walk {
    order: Order,
    stack: SmallVec<[Step; 16]>,
}

impl Walk {
    pub(crate) fn new(start: NodeId, order: Order) -> Self {
        let mut stack = SmallVec::new();
        stack.push(Step::Descend(start));
        Self { order, stack }
    }

    pub(crate) fn next(&mut self, tree: &Tree) -> Option<NodeId> {
        while let Some(step) = self.stack.pop() {
            let node = match step {
                Step::Visit(node) => return Some(node),
                Step::Descend(node) => node,
            };
            let left = tree.left_of(node).map(Step::Descend);
            let right = tree.right_of(node).map(Step::Descend);
            let visit = Some(Step::Visit(node));
            // Pushed in reverse so the first action ends up on top.
            let actions = match self.order {
                Order::Pre => [right, left, visit],
                Order::In => [right, visit, left],
                Order::Post => [visit, right, left],
            };
            self.stack.extend(actions.into_iter().flatten());
        }
        None
    }
}

#[derive(Clone, Copy, Debug)]
enum Thread {
    Start,
    At(NodeId),
}

#[derive(Clone, Debug)]
enum CursorState {
    Walk(Walk),
    Threaded { order: Order, at: Thread },
    Finished,
}

/// A running traversal.
///
/// Created by [`Tree::start_traversal`]. Each call to [`Cursor::advance`]
/// first checks that the cursor still owns the tree's current traversal
/// generation; once it does not, the cursor is finished for good.
#[derive(Clone, Debug)]
pub struct Cursor {
    generation: u64,
    kind: TraversalKind,
    state: CursorState,
}

impl Cursor {
    /// The traversal generation captured when this cursor started.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// What this cursor walks.
    pub fn kind(&self) -> TraversalKind {
        self.kind
    }

    /// Returns true once the cursor has completed or observed cancellation.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, CursorState::Finished)
    }

    /// Returns true if the tree has moved on to a newer generation.
    pub fn is_cancelled(&self, tree: &Tree) -> bool {
        !tree.playback.is_current(self.generation)
    }

    /// Move to the next node and return it.
    ///
    /// Returns `None` when the walk is exhausted or the cursor was cancelled.
    /// On natural exhaustion the tree's active flag is cleared.
    pub fn advance(&mut self, tree: &Tree) -> Option<NodeId> {
        if self.is_finished() {
            return None;
        }
        if self.is_cancelled(tree) {
            debug!(generation = self.generation, "traversal cancelled");
            self.state = CursorState::Finished;
            return None;
        }

        let next = match &mut self.state {
            CursorState::Walk(walk) => walk.next(tree),
            CursorState::Threaded { order, at } => {
                let next = match *at {
                    Thread::Start => Some(threaded_start(tree, *order)),
                    Thread::At(node) => threaded_successor(tree, *order, node),
                };
                if let Some(node) = next {
                    *at = Thread::At(node);
                }
                next
            }
            CursorState::Finished => None,
        };

        match next {
            Some(node) => trace!(generation = self.generation, ?node, "visit"),
            None => {
                self.state = CursorState::Finished;
                tree.playback.complete(self.generation);
                debug!(generation = self.generation, "traversal completed");
            }
        }
        next
    }
}

/// First node of the threaded order.
///
/// In- and post-order both begin at the end of the chain of `left` links,
/// following `prev` where a `left` link is missing; every hop moves strictly
/// earlier in the order, and only the first node has neither.
fn threaded_start(tree: &Tree, order: Order) -> NodeId {
    let mut node = tree.root();
    if order == Order::Pre {
        return node;
    }
    while let Some(next) = tree
        .left_of(node)
        .or_else(|| tree.thread_links(node).and_then(|l| l.prev))
    {
        node = next;
    }
    node
}

fn threaded_successor(tree: &Tree, order: Order, node: NodeId) -> Option<NodeId> {
    let thread_next = || tree.thread_links(node).and_then(|l| l.next);
    match order {
        Order::Pre => tree
            .left_of(node)
            .or_else(|| tree.right_of(node))
            .or_else(thread_next),
        Order::In => match tree.right_of(node) {
            Some(right) => Some(leftmost(tree, right)),
            None => thread_next(),
        },
        Order::Post => {
            if let Some(next) = thread_next() {
                return Some(next);
            }
            let parent = tree.parent_of(node)?;
            match tree.right_of(parent) {
                // Coming back up from the right subtree: the parent is next.
                Some(right) if right == node => Some(parent),
                Some(right) => Some(first_post_order(tree, right)),
                None => Some(parent),
            }
        }
    }
}

fn leftmost(tree: &Tree, mut node: NodeId) -> NodeId {
    while let Some(left) = tree.left_of(node) {
        node = left;
    }
    node
}

/// First post-order node of the subtree at `node`: descend preferring `left`
/// until a leaf is reached.
fn first_post_order(tree: &Tree, mut node: NodeId) -> NodeId {
    while let Some(child) = tree.left_of(node).or_else(|| tree.right_of(node)) {
        node = child;
    }
    node
}

impl Tree {
    /// Start a traversal, cancelling the one in flight if any.
    ///
    /// This is the single cancellation point: it bumps the traversal generation
    /// and marks a traversal as active, whatever was running before. Fails with
    /// [`TreeError::ThreadingRequired`] for [`TraversalKind::Threaded`] unless a
    /// threading order is currently applied; in that case nothing is cancelled.
    pub fn start_traversal(&mut self, kind: impl Into<TraversalKind>) -> Result<Cursor, TreeError> {
        let kind = kind.into();
        let state = match kind {
            TraversalKind::Walk(order) => CursorState::Walk(Walk::new(self.root(), order)),
            TraversalKind::Threaded => {
                let order = self.threading.active().ok_or(TreeError::ThreadingRequired)?;
                CursorState::Threaded {
                    order,
                    at: Thread::Start,
                }
            }
        };
        let generation = self.playback.begin();
        debug!(generation, ?kind, "traversal started");
        Ok(Cursor {
            generation,
            kind,
            state,
        })
    }

    /// Cancel whatever traversal is in flight, for example when the host
    /// surface is torn down or resized.
    pub fn cancel_traversal(&mut self) {
        self.playback.invalidate();
    }

    /// Returns true while the most recently started traversal has neither
    /// completed nor been cancelled.
    pub fn is_traversal_active(&self) -> bool {
        self.playback.active.get()
    }

    /// The current traversal generation. Monotonically increasing.
    pub fn generation(&self) -> u64 {
        self.playback.generation
    }
}
