//! The belief tree: two handle-indexed arenas.
//!
//! Belief nodes (b-nodes) and action-branch nodes (ba-nodes) live in
//! parallel column vectors grown by append, cross-linked purely by
//! `usize` handles — no references, no cycles, stable indices, and the
//! backup pass can mutate bound columns without fighting an ownership
//! graph. Children are allocated contiguously, so each node stores a
//! single `Range` into the sibling arena.

mod tree;

pub use tree::*;
