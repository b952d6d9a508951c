//! Decision node storage.

use std::collections::BTreeMap;

use crate::classes::ClassId;

use super::NodeId;

/// Kind-specific payload and outgoing branches of a decision node.
///
/// One variant per node kind; traversal dispatches by pattern match, so a
/// new kind cannot be added without the compiler pointing at every place
/// that must handle it.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Terminal node.
    Leaf,
    /// Binary split on a real-valued attribute against a threshold.
    ///
    /// `below` is taken when `value <= threshold`, `above` otherwise.
    Continuous {
        attribute: usize,
        threshold: f64,
        below: Option<NodeId>,
        above: Option<NodeId>,
    },
    /// Branch selection by exact categorical value.
    Discrete {
        attribute: usize,
        branches: BTreeMap<String, NodeId>,
    },
    /// Branch selection by nearest centroid over a vector-valued attribute.
    ///
    /// `branches[k]` is the child for centroid `k`; slots may be vacant in
    /// malformed bundles, which traversal reports as an error.
    Vector {
        attribute: usize,
        centroids: Vec<Vec<f64>>,
        branches: Vec<Option<NodeId>>,
    },
}

impl NodeKind {
    /// Whether this kind carries at least one child.
    ///
    /// This is the *effective* leaf test used by traversal: a split-tagged
    /// node without children still terminates like a leaf. Trained bundles
    /// in the wild contain such nodes, so the leniency is load-bearing.
    pub fn has_children(&self) -> bool {
        match self {
            NodeKind::Leaf => false,
            NodeKind::Continuous { below, above, .. } => below.is_some() || above.is_some(),
            NodeKind::Discrete { branches, .. } => !branches.is_empty(),
            NodeKind::Vector { branches, .. } => branches.iter().any(Option::is_some),
        }
    }

    /// Collect the ids of all children, in deterministic branch order.
    pub fn child_ids(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Leaf => Vec::new(),
            NodeKind::Continuous { below, above, .. } => {
                below.iter().chain(above.iter()).copied().collect()
            }
            NodeKind::Discrete { branches, .. } => branches.values().copied().collect(),
            NodeKind::Vector { branches, .. } => branches.iter().flatten().copied().collect(),
        }
    }
}

/// One decision node in a [`Tree`](super::Tree) arena.
///
/// Immutable once constructed: the per-class totals are computed in
/// [`Node::new`] and never touched again. `parent` is a non-owning
/// back-reference for lookups only; ownership flows strictly root-to-leaf
/// through the child ids in `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    parent: Option<NodeId>,
    class: ClassId,
    weights: Box<[(ClassId, f64)]>,
    counts: Box<[(ClassId, u64)]>,
    total_weight: f64,
    total_count: u64,
    kind: NodeKind,
}

impl Node {
    /// Build a node, deriving its weight and count totals.
    pub fn new(
        parent: Option<NodeId>,
        class: ClassId,
        weights: Vec<(ClassId, f64)>,
        counts: Vec<(ClassId, u64)>,
        kind: NodeKind,
    ) -> Self {
        let total_weight = weights.iter().map(|&(_, w)| w).sum();
        let total_count = counts.iter().map(|&(_, c)| c).sum();
        Self {
            parent,
            class,
            weights: weights.into_boxed_slice(),
            counts: counts.into_boxed_slice(),
            total_weight,
            total_count,
            kind,
        }
    }

    /// Non-owning back-reference to the parent node.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Majority class at this node.
    ///
    /// Meaningful at leaves and as the discrete unseen-value fallback.
    #[inline]
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Per-class training sample weights (unnormalized distribution).
    #[inline]
    pub fn weights(&self) -> &[(ClassId, f64)] {
        &self.weights
    }

    /// Per-class training sample counts.
    #[inline]
    pub fn counts(&self) -> &[(ClassId, u64)] {
        &self.counts
    }

    /// Sum of per-class weights, fixed at construction.
    #[inline]
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Sum of per-class counts, fixed at construction.
    #[inline]
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Kind-specific payload and branches.
    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Effective leaf test: no children, whatever the kind tag says.
    #[inline]
    pub fn has_children(&self) -> bool {
        self.kind.has_children()
    }
}
