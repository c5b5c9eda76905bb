// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_threaded_tree --heading-base-level=0

//! Understory Threaded Tree: an editable binary tree with threading, row layout, and
//! cancellable traversal playback.
//!
//! Understory Threaded Tree is a building block for teaching tools and visualizers that
//! step through a binary tree one node at a time.
//!
//! - Represents a free-form binary tree edited one child slot at a time (no key ordering,
//!   no balancing).
//! - Threads the tree for pre-, in-, or post-order: empty child slots are rewired into
//!   predecessor/successor links, so the order can be walked without recursion or a stack.
//! - Lays the tree out in breadth-first rows on a surface of any size.
//! - Plays traversals back one node at a time, with at most one traversal active per tree.
//!
//! ## Not a renderer
//!
//! This crate does not draw anything or handle input. Hosts read [`Layout`] rows and
//! positions to draw nodes and edges, read [`Tree::thread_links`] to draw threads, and
//! consume [`Visit`] events to animate a traversal.
//!
//! ## Cancellation
//!
//! Every tree carries a traversal generation. Starting a traversal, editing the tree,
//! changing its threading, or calling [`Tree::cancel_traversal`] moves to a new generation.
//! A [`Cursor`] (or the [`Playback`] stream built on it) remembers the generation it
//! started in and stops at its next node boundary once that is no longer current. Only
//! the latest traversal clears [`Tree::is_traversal_active`] when it runs to completion.
//!
//! ## API overview
//!
//! - [`Tree`]: node storage and structural edits.
//! - [`NodeId`]: generational handle of a node.
//! - [`Side`], [`Order`], [`TraversalKind`], [`Threading`], [`ThreadLinks`].
//! - [`TreeError`]: rejected edits and traversal requests.
//! - [`Layout`] / [`LayoutOptions`]: row decomposition and coordinates.
//! - [`Cursor`]: synchronous, cancellable traversal.
//! - [`Playback`] / [`PlaybackOptions`] / [`Dwell`]: the same traversal as a paced stream of
//!   [`Visit`] events.
//!
//! Key operations:
//! - [`Tree::add_child`](Tree::add_child) → [`NodeId`]
//! - [`Tree::remove_subtree`](Tree::remove_subtree) / [`Tree::try_remove_leaf`](Tree::try_remove_leaf)
//! - [`Tree::apply_threading`](Tree::apply_threading) / [`Tree::refresh_threading`](Tree::refresh_threading) /
//!   [`Tree::clear_threading`](Tree::clear_threading)
//! - [`Tree::layout`](Tree::layout) or the pure [`layout::compute`]
//! - [`Tree::start_traversal`](Tree::start_traversal) → [`Cursor`], or [`Playback::start`]
//!
//! ## Example
//!
//! ```rust
//! use kurbo::Size;
//! use understory_threaded_tree::{LayoutOptions, Order, Side, TraversalKind, Tree};
//!
//! let mut tree = Tree::new();
//! let root = tree.root();
//! let l = tree.add_child(root, Side::Left).unwrap();
//! let r = tree.add_child(root, Side::Right).unwrap();
//! let rr = tree.add_child(r, Side::Right).unwrap();
//!
//! let layout = tree.layout(Size::new(400.0, 300.0), LayoutOptions::default());
//! assert_eq!(layout.row_count(), 3);
//! assert_eq!(layout.leaf_count(), 2);
//!
//! tree.apply_threading(Order::In);
//! assert_eq!(tree.thread_links(l).unwrap().next, Some(root));
//! assert_eq!(tree.thread_links(rr).unwrap().prev, Some(r));
//!
//! let mut cursor = tree.start_traversal(TraversalKind::Threaded).unwrap();
//! let visited: Vec<_> = core::iter::from_fn(|| cursor.advance(&tree)).collect();
//! assert_eq!(visited, [l, root, r, rr]);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod error;
pub mod layout;
mod playback;
mod threading;
mod traversal;
mod tree;
mod types;

pub use error::TreeError;
pub use layout::{Layout, LayoutOptions};
pub use playback::{Dwell, Phase, Playback, PlaybackOptions, Visit};
pub use traversal::Cursor;
pub use tree::Tree;
pub use types::{NodeId, Order, Side, ThreadLinks, Threading, TraversalKind};
