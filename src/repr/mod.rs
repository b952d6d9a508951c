//! Canonical decision-tree representation.
//!
//! Trees are stored as flat node arenas: children reference each other by
//! [`NodeId`] and the parent back-reference is a plain optional index, so
//! the bidirectional links of the logical tree never form an ownership
//! cycle.

/// Canonical node identifier: an index into the tree's node arena.
pub type NodeId = u32;

/// Arena index of the root node.
pub const ROOT: NodeId = 0;

pub mod node;
pub mod tree;

pub use node::{Node, NodeKind};
pub use tree::{EvaluateError, Tree, TreeValidationError};
