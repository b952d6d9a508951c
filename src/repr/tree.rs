//! Decision tree arena and traversal.
//!
//! A [`Tree`] owns its nodes in a flat arena; the node at index 0 is the
//! root. Traversal is pure: identical samples always reach the identical
//! terminal node, and no node state is ever mutated after construction.

use std::fmt;

use thiserror::Error;

use crate::classes::{ClassCatalog, ClassId};
use crate::sample::{Sample, SampleError};

use super::node::{Node, NodeKind};
use super::{NodeId, ROOT};

/// Errors raised while routing a sample through a tree.
///
/// Everything here is fatal for the classification call: either the sample
/// does not match the trained attribute layout, or the model itself is
/// structurally broken at the point traversal reached. A discrete lookup
/// miss is *not* an error; it resolves to the current node's own class and
/// distribution by design.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluateError {
    /// The sample does not match the attribute layout (bad index or kind).
    #[error(transparent)]
    Sample(#[from] SampleError),
    /// A continuous split is missing the child the comparison selected.
    #[error("continuous split at node {node} is missing its {branch:?} child")]
    MissingBranch { node: NodeId, branch: &'static str },
    /// A vector split selected a centroid with a vacant child slot.
    #[error("vector split at node {node} has no child for centroid {centroid}")]
    MissingCentroidBranch { node: NodeId, centroid: usize },
    /// A vector split with children but no centroids to compare against.
    #[error("vector split at node {node} has no centroids")]
    NoCentroids { node: NodeId },
    /// A vector attribute whose dimensionality differs from the centroids.
    #[error(
        "vector split at node {node}: centroid {centroid} has {expected} dimensions, value has {found}"
    )]
    CentroidDimMismatch {
        node: NodeId,
        centroid: usize,
        expected: usize,
        found: usize,
    },
}

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeValidationError {
    /// Tree has no nodes.
    #[error("tree has no nodes")]
    EmptyTree,
    /// A branch references an out-of-bounds node.
    #[error("node {node} references child {child} but the tree has {n_nodes} nodes")]
    ChildOutOfBounds {
        node: NodeId,
        child: NodeId,
        n_nodes: usize,
    },
    /// A node references itself as a child.
    #[error("node {node} references itself as a child")]
    SelfLoop { node: NodeId },
    /// A node was reached by more than one path, or via a cycle.
    #[error("node {node} is reachable by more than one path")]
    DuplicateVisit { node: NodeId },
    /// A node exists in the arena but is unreachable from the root.
    #[error("node {node} is unreachable from the root")]
    UnreachableNode { node: NodeId },
    /// A child's parent back-reference does not point at its actual parent.
    #[error("node {node} records parent {found:?} but is a child of {expected}")]
    ParentMismatch {
        node: NodeId,
        expected: NodeId,
        found: Option<NodeId>,
    },
}

/// One decision tree: a root [`Node`] plus its recursively owned children,
/// flattened into an arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

/// Outcome of one dispatch step during traversal.
enum Step {
    /// Terminate at the current node (real leaf, effective leaf, or the
    /// discrete unseen-value fallback).
    Terminal,
    /// Continue into a child.
    Descend(NodeId),
}

impl Tree {
    /// Wrap an arena of nodes. Node 0 must be the root.
    ///
    /// Structural invariants are not checked here; loading code runs
    /// [`validate`](Self::validate) after conversion.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Number of nodes in the arena.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Borrow a node by id.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    /// Borrow the root node.
    #[inline]
    pub fn root(&self) -> &Node {
        &self.nodes[ROOT as usize]
    }

    /// Effective leaf test for a node: it carries no children.
    #[inline]
    pub fn is_effective_leaf(&self, id: NodeId) -> bool {
        !self.node(id).has_children()
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Hard evaluation: route the sample to its terminal node and return
    /// that node's majority class.
    pub fn evaluate(&self, sample: &Sample) -> Result<ClassId, EvaluateError> {
        Ok(self.terminal(sample)?.class())
    }

    /// Probabilistic evaluation: route the sample to its terminal node and
    /// return that node's unnormalized per-class weight distribution.
    pub fn probabilistic_evaluate(
        &self,
        sample: &Sample,
    ) -> Result<&[(ClassId, f64)], EvaluateError> {
        Ok(self.terminal(sample)?.weights())
    }

    /// Route a sample from the root to the node where traversal terminates.
    ///
    /// Both evaluation modes share this dispatch; they differ only in what
    /// they read off the terminal node. Termination happens at real leaves,
    /// at split-tagged nodes without children, and at discrete splits whose
    /// lookup missed (the designed unseen-value fallback).
    pub fn terminal(&self, sample: &Sample) -> Result<&Node, EvaluateError> {
        let mut id = ROOT;
        loop {
            match self.step(id, sample)? {
                Step::Terminal => return Ok(self.node(id)),
                Step::Descend(child) => id = child,
            }
        }
    }

    /// Dispatch one node against the sample.
    fn step(&self, id: NodeId, sample: &Sample) -> Result<Step, EvaluateError> {
        let node = self.node(id);

        // Children empty means terminal, regardless of the kind tag.
        if !node.has_children() {
            return Ok(Step::Terminal);
        }

        match node.kind() {
            NodeKind::Leaf => Ok(Step::Terminal),
            NodeKind::Continuous {
                attribute,
                threshold,
                below,
                above,
            } => {
                let value = sample.number(*attribute)?;
                let (child, branch) = if value <= *threshold {
                    (below, "<=")
                } else {
                    (above, ">")
                };
                child
                    .map(Step::Descend)
                    .ok_or(EvaluateError::MissingBranch { node: id, branch })
            }
            NodeKind::Discrete {
                attribute,
                branches,
            } => {
                let value = sample.category(*attribute)?;
                // Unseen value: terminate here with the node's own majority
                // class / distribution.
                Ok(match branches.get(value) {
                    Some(&child) => Step::Descend(child),
                    None => Step::Terminal,
                })
            }
            NodeKind::Vector {
                attribute,
                centroids,
                branches,
            } => {
                let value = sample.vector(*attribute)?;
                let nearest = nearest_centroid(id, value, centroids)?;
                branches
                    .get(nearest)
                    .copied()
                    .flatten()
                    .map(Step::Descend)
                    .ok_or(EvaluateError::MissingCentroidBranch {
                        node: id,
                        centroid: nearest,
                    })
            }
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate structural invariants: children in bounds, no sharing or
    /// cycles, every node reachable, parent back-references consistent.
    ///
    /// Run once at load; traversal assumes these hold.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.nodes.len();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }

        let mut visited = vec![false; n_nodes];
        let mut stack: Vec<NodeId> = vec![ROOT];

        while let Some(id) = stack.pop() {
            let idx = id as usize;
            if visited[idx] {
                return Err(TreeValidationError::DuplicateVisit { node: id });
            }
            visited[idx] = true;

            for child in self.node(id).kind().child_ids() {
                if child == id {
                    return Err(TreeValidationError::SelfLoop { node: id });
                }
                let child_idx = child as usize;
                if child_idx >= n_nodes {
                    return Err(TreeValidationError::ChildOutOfBounds {
                        node: id,
                        child,
                        n_nodes,
                    });
                }
                let recorded = self.node(child).parent();
                if recorded != Some(id) {
                    return Err(TreeValidationError::ParentMismatch {
                        node: child,
                        expected: id,
                        found: recorded,
                    });
                }
                stack.push(child);
            }
        }

        for (idx, &seen) in visited.iter().enumerate() {
            if !seen {
                return Err(TreeValidationError::UnreachableNode { node: idx as NodeId });
            }
        }

        Ok(())
    }

    /// Render the tree as an indented ASCII dump, resolving class ids
    /// through the given catalog.
    pub fn display<'a>(&'a self, catalog: &'a ClassCatalog) -> TreeDisplay<'a> {
        TreeDisplay { tree: self, catalog }
    }
}

/// Select the centroid nearest to `value` by Euclidean distance.
///
/// Ties break toward the lowest index: only a strictly smaller distance
/// displaces the current best.
fn nearest_centroid(
    node: NodeId,
    value: &[f64],
    centroids: &[Vec<f64>],
) -> Result<usize, EvaluateError> {
    let mut best: Option<(usize, f64)> = None;

    for (k, centroid) in centroids.iter().enumerate() {
        if centroid.len() != value.len() {
            return Err(EvaluateError::CentroidDimMismatch {
                node,
                centroid: k,
                expected: centroid.len(),
                found: value.len(),
            });
        }
        let dist = value
            .iter()
            .zip(centroid.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt();
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((k, dist)),
        }
    }

    best.map(|(k, _)| k)
        .ok_or(EvaluateError::NoCentroids { node })
}

// =============================================================================
// ASCII dump
// =============================================================================

/// Indented recursive dump of a tree, for debugging trained bundles.
pub struct TreeDisplay<'a> {
    tree: &'a Tree,
    catalog: &'a ClassCatalog,
}

impl fmt::Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, ROOT, 0, "")
    }
}

impl TreeDisplay<'_> {
    fn class_name(&self, id: ClassId) -> &str {
        self.catalog.label(id).unwrap_or("?")
    }

    fn write_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: NodeId,
        depth: usize,
        prefix: &str,
    ) -> fmt::Result {
        let node = self.tree.node(id);
        let pad = "  ".repeat(depth);

        if !node.has_children() {
            write!(f, "{pad}{prefix}class ({})", self.class_name(node.class()))?;
            for (class, count) in node.counts() {
                write!(f, " {}={}", self.class_name(*class), count)?;
            }
            return writeln!(f);
        }

        match node.kind() {
            NodeKind::Leaf => Ok(()),
            NodeKind::Continuous {
                attribute,
                threshold,
                below,
                above,
            } => {
                writeln!(f, "{pad}{prefix}att ({attribute}), threshold = {threshold}")?;
                if let Some(child) = below {
                    self.write_node(f, *child, depth + 1, "<= ")?;
                }
                if let Some(child) = above {
                    self.write_node(f, *child, depth + 1, ">  ")?;
                }
                Ok(())
            }
            NodeKind::Discrete {
                attribute,
                branches,
            } => {
                writeln!(f, "{pad}{prefix}att ({attribute}), discrete")?;
                for (value, child) in branches {
                    self.write_node(f, *child, depth + 1, &format!("{value}: "))?;
                }
                Ok(())
            }
            NodeKind::Vector {
                attribute,
                centroids,
                branches,
            } => {
                writeln!(f, "{pad}{prefix}att ({attribute}), vector")?;
                for (k, child) in branches.iter().enumerate() {
                    if let Some(child) = child {
                        self.write_node(f, *child, depth + 1, &format!("{:?}: ", centroids[k]))?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::FeatureValue;
    use std::collections::BTreeMap;

    fn leaf(parent: Option<NodeId>, class: ClassId, weight: f64) -> Node {
        Node::new(
            parent,
            class,
            vec![(class, weight)],
            vec![(class, 1)],
            NodeKind::Leaf,
        )
    }

    /// root: att0 <= 5.0 ? leaf(A) : leaf(B)
    fn continuous_tree() -> Tree {
        let root = Node::new(
            None,
            0,
            vec![(0, 3.0), (1, 1.0)],
            vec![(0, 3), (1, 1)],
            NodeKind::Continuous {
                attribute: 0,
                threshold: 5.0,
                below: Some(1),
                above: Some(2),
            },
        );
        Tree::from_nodes(vec![root, leaf(Some(0), 0, 3.0), leaf(Some(0), 1, 1.0)])
    }

    #[test]
    fn continuous_boundary_routes_below() {
        let tree = continuous_tree();
        // The boundary value itself takes the <= branch.
        assert_eq!(tree.evaluate(&Sample::from_numbers(&[5.0])).unwrap(), 0);
        assert_eq!(tree.evaluate(&Sample::from_numbers(&[5.0001])).unwrap(), 1);
    }

    #[test]
    fn probabilistic_returns_leaf_weights() {
        let tree = continuous_tree();
        let dist = tree
            .probabilistic_evaluate(&Sample::from_numbers(&[1.0]))
            .unwrap();
        assert_eq!(dist, &[(0, 3.0)]);
    }

    #[test]
    fn continuous_missing_child_is_malformed() {
        let root = Node::new(
            None,
            0,
            vec![(0, 1.0)],
            vec![(0, 1)],
            NodeKind::Continuous {
                attribute: 0,
                threshold: 5.0,
                below: Some(1),
                above: None,
            },
        );
        let tree = Tree::from_nodes(vec![root, leaf(Some(0), 0, 1.0)]);

        // Below branch still works.
        assert_eq!(tree.evaluate(&Sample::from_numbers(&[4.0])).unwrap(), 0);
        // Above branch is absent: malformed model, not a silent fallback.
        let err = tree.evaluate(&Sample::from_numbers(&[6.0])).unwrap_err();
        assert_eq!(err, EvaluateError::MissingBranch { node: 0, branch: ">" });
    }

    #[test]
    fn split_tagged_node_without_children_acts_as_leaf() {
        // Known edge case: a continuous-tagged node with no children at all
        // must evaluate like a leaf, not raise.
        let orphan = Node::new(
            None,
            7,
            vec![(7, 2.0)],
            vec![(7, 2)],
            NodeKind::Continuous {
                attribute: 0,
                threshold: 5.0,
                below: None,
                above: None,
            },
        );
        let tree = Tree::from_nodes(vec![orphan]);
        assert_eq!(tree.evaluate(&Sample::from_numbers(&[100.0])).unwrap(), 7);
    }

    fn discrete_tree() -> Tree {
        let mut branches = BTreeMap::new();
        branches.insert("x".to_string(), 1);
        branches.insert("y".to_string(), 2);
        let root = Node::new(
            None,
            2, // own class "z"
            vec![(0, 1.0), (1, 1.0), (2, 2.0)],
            vec![(0, 1), (1, 1), (2, 2)],
            NodeKind::Discrete {
                attribute: 0,
                branches,
            },
        );
        Tree::from_nodes(vec![root, leaf(Some(0), 0, 1.0), leaf(Some(0), 1, 1.0)])
    }

    #[test]
    fn discrete_dispatch_by_exact_value() {
        let tree = discrete_tree();
        let sample = Sample::new(vec![FeatureValue::from("x")]);
        assert_eq!(tree.evaluate(&sample).unwrap(), 0);
        let sample = Sample::new(vec![FeatureValue::from("y")]);
        assert_eq!(tree.evaluate(&sample).unwrap(), 1);
    }

    #[test]
    fn discrete_unseen_value_falls_back_to_own_node() {
        let tree = discrete_tree();
        let sample = Sample::new(vec![FeatureValue::from("q")]);
        // Hard mode: the node's own majority class.
        assert_eq!(tree.evaluate(&sample).unwrap(), 2);
        // Probabilistic mode: the node's own distribution, not an error.
        let dist = tree.probabilistic_evaluate(&sample).unwrap();
        assert_eq!(dist, &[(0, 1.0), (1, 1.0), (2, 2.0)]);
    }

    fn vector_tree() -> Tree {
        let root = Node::new(
            None,
            0,
            vec![(0, 1.0), (1, 1.0)],
            vec![(0, 1), (1, 1)],
            NodeKind::Vector {
                attribute: 0,
                centroids: vec![vec![0.0, 0.0], vec![10.0, 10.0]],
                branches: vec![Some(1), Some(2)],
            },
        );
        Tree::from_nodes(vec![root, leaf(Some(0), 0, 1.0), leaf(Some(0), 1, 1.0)])
    }

    #[test]
    fn vector_dispatch_by_nearest_centroid() {
        let tree = vector_tree();
        let near_first = Sample::new(vec![vec![1.0, 1.0].into()]);
        assert_eq!(tree.evaluate(&near_first).unwrap(), 0);
        let near_second = Sample::new(vec![vec![9.0, 9.0].into()]);
        assert_eq!(tree.evaluate(&near_second).unwrap(), 1);
    }

    #[test]
    fn vector_equidistant_prefers_lowest_index() {
        let tree = vector_tree();
        let midpoint = Sample::new(vec![vec![5.0, 5.0].into()]);
        assert_eq!(tree.evaluate(&midpoint).unwrap(), 0);
    }

    #[test]
    fn vector_dim_mismatch_fails_fast() {
        let tree = vector_tree();
        let skewed = Sample::new(vec![vec![1.0, 1.0, 1.0].into()]);
        assert!(matches!(
            tree.evaluate(&skewed).unwrap_err(),
            EvaluateError::CentroidDimMismatch { .. }
        ));
    }

    #[test]
    fn wrong_value_kind_fails_fast() {
        let tree = continuous_tree();
        let sample = Sample::new(vec![FeatureValue::from("oops")]);
        assert!(matches!(
            tree.evaluate(&sample).unwrap_err(),
            EvaluateError::Sample(SampleError::WrongValueKind { .. })
        ));
    }

    #[test]
    fn short_sample_fails_fast() {
        let tree = continuous_tree();
        let sample = Sample::from_numbers(&[]);
        assert!(matches!(
            tree.evaluate(&sample).unwrap_err(),
            EvaluateError::Sample(SampleError::AttributeOutOfBounds { .. })
        ));
    }

    #[test]
    fn validate_accepts_well_formed_tree() {
        assert_eq!(continuous_tree().validate(), Ok(()));
        assert_eq!(discrete_tree().validate(), Ok(()));
        assert_eq!(vector_tree().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_out_of_bounds_child() {
        let root = Node::new(
            None,
            0,
            vec![(0, 1.0)],
            vec![(0, 1)],
            NodeKind::Continuous {
                attribute: 0,
                threshold: 0.5,
                below: Some(9),
                above: None,
            },
        );
        let tree = Tree::from_nodes(vec![root]);
        assert_eq!(
            tree.validate(),
            Err(TreeValidationError::ChildOutOfBounds {
                node: 0,
                child: 9,
                n_nodes: 1
            })
        );
    }

    #[test]
    fn validate_rejects_bad_parent_link() {
        let root = Node::new(
            None,
            0,
            vec![(0, 1.0)],
            vec![(0, 1)],
            NodeKind::Continuous {
                attribute: 0,
                threshold: 0.5,
                below: Some(1),
                above: None,
            },
        );
        // Child claims no parent.
        let child = leaf(None, 0, 1.0);
        let tree = Tree::from_nodes(vec![root, child]);
        assert_eq!(
            tree.validate(),
            Err(TreeValidationError::ParentMismatch {
                node: 1,
                expected: 0,
                found: None
            })
        );
    }

    #[test]
    fn validate_rejects_unreachable_node() {
        let root = leaf(None, 0, 1.0);
        let stray = leaf(None, 0, 1.0);
        let tree = Tree::from_nodes(vec![root, stray]);
        assert_eq!(
            tree.validate(),
            Err(TreeValidationError::UnreachableNode { node: 1 })
        );
    }

    #[test]
    fn display_renders_splits_and_leaves() {
        let catalog = ClassCatalog::from_class_list(["A", "B"]).unwrap();
        let dump = continuous_tree().display(&catalog).to_string();
        assert!(dump.contains("threshold = 5"));
        assert!(dump.contains("<= class (A)"));
        assert!(dump.contains(">  class (B)"));
    }
}
