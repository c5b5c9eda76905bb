// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paced traversal playback as an asynchronous stream.
//!
//! [`Playback`] drives a [`Cursor`] and turns each visited node into a
//! [`Phase::Focus`] event, a dwell pause, and a [`Phase::Unfocus`] event. The
//! pause comes from a caller-supplied [`Dwell`] source, so any executor or
//! timer works; the stream itself never spawns or blocks.
//!
//! The tree is shared through a [`RefCell`] and borrowed only for the instant
//! a step is taken, so the host may edit the tree or start another traversal
//! between polls. Either one cancels this playback at its next node boundary.

use alloc::boxed::Box;
use core::cell::RefCell;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, ready};
use core::time::Duration;

use futures::Stream;
use futures::stream::FusedStream;

use crate::error::TreeError;
use crate::traversal::Cursor;
use crate::tree::Tree;
use crate::types::{NodeId, TraversalKind};

/// Playback configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackOptions {
    /// Pause between focusing and unfocusing each node. Defaults to 500 ms.
    pub dwell: Duration,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            dwell: Duration::from_millis(500),
        }
    }
}

impl PlaybackOptions {
    /// Set the dwell interval.
    pub fn with_dwell(mut self, dwell: Duration) -> Self {
        self.dwell = dwell;
        self
    }
}

/// Whether a node is gaining or losing focus.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Phase {
    /// The traversal arrived at the node.
    Focus,
    /// The dwell interval elapsed and the traversal is leaving the node.
    Unfocus,
}

/// One playback event.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Visit {
    /// The visited node.
    pub node: NodeId,
    /// Focus or unfocus.
    pub phase: Phase,
}

/// Source of dwell pauses.
///
/// Implemented for any `FnMut(Duration) -> impl Future<Output = ()>`, so a
/// runtime's sleep function can be passed directly, and
/// `|_: Duration| core::future::ready(())` plays back without pausing.
pub trait Dwell {
    /// The pause future.
    type Sleep: Future<Output = ()>;

    /// Start a pause of the given length.
    fn sleep(&mut self, interval: Duration) -> Self::Sleep;
}

impl<F, S> Dwell for F
where
    F: FnMut(Duration) -> S,
    S: Future<Output = ()>,
{
    type Sleep = S;

    fn sleep(&mut self, interval: Duration) -> S {
        self(interval)
    }
}

enum State<S> {
    Advance,
    Dwelling { node: NodeId, sleep: Pin<Box<S>> },
    Done,
}

/// A traversal played back as a [`Stream`] of [`Visit`] events.
///
/// Each node yields `Focus`, then the dwell pause, then `Unfocus`. An unfocus
/// always follows its focus, even if the playback was cancelled meanwhile, so a
/// presenter can restore the node; cancellation is observed at the next node
/// boundary, where the stream ends.
///
/// ## Example
///
/// ```rust
/// use core::cell::RefCell;
/// use core::time::Duration;
/// use futures::{StreamExt, executor::block_on};
/// use understory_threaded_tree::{Order, Phase, Playback, PlaybackOptions, Side, Tree};
///
/// let tree = RefCell::new(Tree::new());
/// let root = tree.borrow().root();
/// let left = tree.borrow_mut().add_child(root, Side::Left).unwrap();
///
/// let playback = Playback::start(
///     &tree,
///     Order::In,
///     PlaybackOptions::default(),
///     |_: Duration| core::future::ready(()),
/// )
/// .unwrap();
///
/// let focused: Vec<_> = block_on(
///     playback
///         .filter(|v| core::future::ready(v.phase == Phase::Focus))
///         .map(|v| v.node)
///         .collect(),
/// );
/// assert_eq!(focused, [left, root]);
/// assert!(!tree.borrow().is_traversal_active());
/// ```
pub struct Playback<'a, D: Dwell> {
    tree: &'a RefCell<Tree>,
    cursor: Cursor,
    dwell: D,
    interval: Duration,
    state: State<D::Sleep>,
}

impl<D: Dwell> core::fmt::Debug for Playback<'_, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = match self.state {
            State::Advance => "advance",
            State::Dwelling { .. } => "dwelling",
            State::Done => "done",
        };
        f.debug_struct("Playback")
            .field("cursor", &self.cursor)
            .field("interval", &self.interval)
            .field("state", &state)
            .finish_non_exhaustive()
    }
}

impl<'a, D: Dwell> Playback<'a, D> {
    /// Start a traversal on `tree` and wrap it in a paced stream.
    ///
    /// Cancels any traversal already in flight on the tree. Fails with
    /// [`TreeError::ThreadingRequired`] for a threaded traversal on an
    /// unthreaded tree. Panics if `tree` is currently borrowed.
    pub fn start(
        tree: &'a RefCell<Tree>,
        kind: impl Into<TraversalKind>,
        options: PlaybackOptions,
        dwell: D,
    ) -> Result<Self, TreeError> {
        let cursor = tree.borrow_mut().start_traversal(kind)?;
        Ok(Self {
            tree,
            cursor,
            dwell,
            interval: options.dwell,
            state: State::Advance,
        })
    }

    /// The traversal generation this playback belongs to.
    pub fn generation(&self) -> u64 {
        self.cursor.generation()
    }

    /// Returns true if a newer traversal generation has superseded this one.
    pub fn is_cancelled(&self) -> bool {
        self.cursor.is_cancelled(&self.tree.borrow())
    }
}

impl<D: Dwell + Unpin> Stream for Playback<'_, D> {
    type Item = Visit;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Visit>> {
        let this = self.get_mut();
        match &mut this.state {
            State::Dwelling { node, sleep } => {
                ready!(sleep.as_mut().poll(cx));
                let node = *node;
                this.state = State::Advance;
                Poll::Ready(Some(Visit {
                    node,
                    phase: Phase::Unfocus,
                }))
            }
            State::Advance => {
                let next = this.cursor.advance(&this.tree.borrow());
                match next {
                    Some(node) => {
                        this.state = State::Dwelling {
                            node,
                            sleep: Box::pin(this.dwell.sleep(this.interval)),
                        };
                        Poll::Ready(Some(Visit {
                            node,
                            phase: Phase::Focus,
                        }))
                    }
                    None => {
                        this.state = State::Done;
                        Poll::Ready(None)
                    }
                }
            }
            State::Done => Poll::Ready(None),
        }
    }
}

impl<D: Dwell + Unpin> FusedStream for Playback<'_, D> {
    fn is_terminated(&self) -> bool {
        matches!(self.state, State::Done)
    }
}
