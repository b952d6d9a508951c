//! Conversion between schema types and runtime types.
//!
//! Loading is all-or-nothing: any structural mismatch surfaces as a
//! [`LoadError`] and nothing is constructed. The reverse direction
//! (runtime to schema) is infallible and used for saving bundles.

use std::collections::BTreeMap;

use ndarray::Array2;
use thiserror::Error;

use crate::classes::{ClassCatalog, DuplicateClassLabel};
use crate::ensemble::Ensemble;
use crate::projection::Projector;
use crate::repr::node::{Node, NodeKind};
use crate::repr::{NodeId, Tree, TreeValidationError, ROOT};

use super::schema::{
    AttributeStatsSchema, EnsembleSchema, NodeKindSchema, NodeSchema, ProjectorSchema,
};

/// Fatal model bundle errors.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read model bundle")]
    Io(#[from] std::io::Error),
    #[error("failed to parse model bundle")]
    Json(#[from] serde_json::Error),
    #[error("ensemble has no trees")]
    EmptyEnsemble,
    #[error("ensemble has {trees} trees but {weights} boosting weights")]
    TreeWeightCountMismatch { trees: usize, weights: usize },
    #[error(transparent)]
    DuplicateClassLabel(#[from] DuplicateClassLabel),
    #[error("leaf node carries children")]
    LeafWithChildren,
    #[error("continuous node has branch key {key:?}, expected \"0\" or \"1\"")]
    InvalidContinuousBranch { key: String },
    #[error("vector node branch key {key:?} is not a centroid index")]
    InvalidCentroidBranch { key: String },
    #[error("vector node branch {index} is out of range for {centroids} centroids")]
    CentroidBranchOutOfRange { index: usize, centroids: usize },
    #[error("tree {tree} failed structural validation: {error}")]
    InvalidTree {
        tree: usize,
        error: TreeValidationError,
    },
    #[error("projector basis vector {index} has {found} attributes, expected {expected}")]
    BasisDimMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("projector needs {needed} basis vectors but the bundle has {available}")]
    InsufficientBasisVectors { needed: usize, available: usize },
}

// =============================================================================
// Schema -> runtime
// =============================================================================

/// Build the runtime ensemble (and projector, when bundled) from schemas.
///
/// With a projector bundle, the projector's class list fixes the output
/// ordering. Without one, the class list is deduced from the trees: leaf
/// majority classes in depth-first, branch-key order.
pub fn build_parts(
    ensemble: EnsembleSchema,
    projector: Option<ProjectorSchema>,
) -> Result<(Ensemble, Option<Projector>), LoadError> {
    if ensemble.trees.is_empty() {
        return Err(LoadError::EmptyEnsemble);
    }
    if ensemble.trees.len() != ensemble.weights.len() {
        return Err(LoadError::TreeWeightCountMismatch {
            trees: ensemble.trees.len(),
            weights: ensemble.weights.len(),
        });
    }

    let (mut catalog, projector) = match projector {
        Some(schema) => {
            let catalog = ClassCatalog::from_class_list(schema.class_list.iter().cloned())?;
            let projector = build_projector(schema)?;
            (catalog, Some(projector))
        }
        None => {
            let mut catalog = ClassCatalog::new();
            for root in &ensemble.trees {
                collect_leaf_classes(root, &mut catalog);
            }
            (catalog, None)
        }
    };

    let mut trees = Vec::with_capacity(ensemble.trees.len());
    for (tree_idx, root) in ensemble.trees.iter().enumerate() {
        let mut arena = Vec::new();
        push_node(&mut arena, root, None, &mut catalog)?;
        let tree = Tree::from_nodes(arena);
        tree.validate()
            .map_err(|error| LoadError::InvalidTree { tree: tree_idx, error })?;
        trees.push(tree);
    }

    Ok((Ensemble::new(trees, ensemble.weights, catalog), projector))
}

/// Deduce the class list from leaf majority classes, depth first.
///
/// Only *effective* leaves contribute, matching traversal's leaf test:
/// a split-tagged node without children counts as a leaf here too.
fn collect_leaf_classes(node: &NodeSchema, catalog: &mut ClassCatalog) {
    if node.children.is_empty() {
        catalog.intern_listed(&node.class);
        return;
    }
    for child in node.children.values() {
        collect_leaf_classes(child, catalog);
    }
}

/// Recursively flatten a schema subtree into the arena, returning the id
/// of the node created for `schema`.
fn push_node(
    arena: &mut Vec<Node>,
    schema: &NodeSchema,
    parent: Option<NodeId>,
    catalog: &mut ClassCatalog,
) -> Result<NodeId, LoadError> {
    let id = arena.len() as NodeId;
    // Reserve the slot so children receive correct arena indices.
    arena.push(Node::new(None, 0, Vec::new(), Vec::new(), NodeKind::Leaf));

    let class = catalog.intern(&schema.class);
    let weights: Vec<_> = schema
        .weights
        .iter()
        .map(|(label, &w)| (catalog.intern(label), w))
        .collect();
    let counts: Vec<_> = schema
        .counts
        .iter()
        .map(|(label, &c)| (catalog.intern(label), c))
        .collect();

    let kind = match &schema.kind {
        NodeKindSchema::Leaf => {
            if !schema.children.is_empty() {
                return Err(LoadError::LeafWithChildren);
            }
            NodeKind::Leaf
        }
        NodeKindSchema::Continuous {
            attribute,
            threshold,
        } => {
            let mut below = None;
            let mut above = None;
            for (key, child) in &schema.children {
                let child_id = push_node(arena, child, Some(id), catalog)?;
                match key.as_str() {
                    "0" => below = Some(child_id),
                    "1" => above = Some(child_id),
                    _ => {
                        return Err(LoadError::InvalidContinuousBranch { key: key.clone() });
                    }
                }
            }
            NodeKind::Continuous {
                attribute: *attribute,
                threshold: *threshold,
                below,
                above,
            }
        }
        NodeKindSchema::Discrete { attribute, .. } => {
            let mut branches = BTreeMap::new();
            for (key, child) in &schema.children {
                let child_id = push_node(arena, child, Some(id), catalog)?;
                // Training pipelines have been seen emitting padded keys;
                // dispatch is on the trimmed value.
                branches.insert(key.trim().to_string(), child_id);
            }
            NodeKind::Discrete {
                attribute: *attribute,
                branches,
            }
        }
        NodeKindSchema::Vector {
            attribute,
            centroids,
        } => {
            let mut branches = vec![None; centroids.len()];
            for (key, child) in &schema.children {
                let index: usize = key
                    .trim()
                    .parse()
                    .map_err(|_| LoadError::InvalidCentroidBranch { key: key.clone() })?;
                if index >= centroids.len() {
                    return Err(LoadError::CentroidBranchOutOfRange {
                        index,
                        centroids: centroids.len(),
                    });
                }
                branches[index] = Some(push_node(arena, child, Some(id), catalog)?);
            }
            NodeKind::Vector {
                attribute: *attribute,
                centroids: centroids.clone(),
                branches,
            }
        }
    };

    arena[id as usize] = Node::new(parent, class, weights, counts, kind);
    Ok(id)
}

/// Build the runtime projector, validating basis dimensions.
fn build_projector(schema: ProjectorSchema) -> Result<Projector, LoadError> {
    let n_attributes = schema.stats.len();

    for (index, row) in schema.basis.iter().enumerate() {
        if row.len() != n_attributes {
            return Err(LoadError::BasisDimMismatch {
                index,
                expected: n_attributes,
                found: row.len(),
            });
        }
    }

    let needed = schema.target_dim.min(n_attributes);
    if schema.basis.len() < needed {
        return Err(LoadError::InsufficientBasisVectors {
            needed,
            available: schema.basis.len(),
        });
    }

    let n_rows = schema.basis.len();
    let flat: Vec<f64> = schema.basis.into_iter().flatten().collect();
    let basis = Array2::from_shape_vec((n_rows, n_attributes), flat)
        .expect("row dimensions were just validated");

    let stats = schema.stats.iter().map(|s| (s.mean, s.std)).collect();
    Ok(Projector::new(stats, basis, schema.target_dim))
}

// =============================================================================
// Runtime -> schema
// =============================================================================

/// Serialize an ensemble back into its schema form.
pub fn ensemble_to_schema(ensemble: &Ensemble) -> EnsembleSchema {
    let catalog = ensemble.catalog();
    EnsembleSchema {
        trees: (0..ensemble.n_trees())
            .map(|i| node_to_schema(ensemble.tree(i), ROOT, catalog))
            .collect(),
        weights: ensemble.weights().to_vec(),
    }
}

fn label_of(catalog: &ClassCatalog, id: crate::classes::ClassId) -> String {
    catalog.label(id).unwrap_or("?").to_string()
}

fn node_to_schema(tree: &Tree, id: NodeId, catalog: &ClassCatalog) -> NodeSchema {
    let node = tree.node(id);

    let weights: BTreeMap<String, f64> = node
        .weights()
        .iter()
        .map(|&(class, w)| (label_of(catalog, class), w))
        .collect();
    let counts: BTreeMap<String, u64> = node
        .counts()
        .iter()
        .map(|&(class, c)| (label_of(catalog, class), c))
        .collect();

    let mut children = BTreeMap::new();
    let kind = match node.kind() {
        NodeKind::Leaf => NodeKindSchema::Leaf,
        NodeKind::Continuous {
            attribute,
            threshold,
            below,
            above,
        } => {
            if let Some(child) = below {
                children.insert("0".to_string(), node_to_schema(tree, *child, catalog));
            }
            if let Some(child) = above {
                children.insert("1".to_string(), node_to_schema(tree, *child, catalog));
            }
            NodeKindSchema::Continuous {
                attribute: *attribute,
                threshold: *threshold,
            }
        }
        NodeKind::Discrete {
            attribute,
            branches,
        } => {
            for (value, child) in branches {
                children.insert(value.clone(), node_to_schema(tree, *child, catalog));
            }
            NodeKindSchema::Discrete {
                attribute: *attribute,
                values: branches.keys().cloned().collect(),
            }
        }
        NodeKind::Vector {
            attribute,
            centroids,
            branches,
        } => {
            for (index, child) in branches.iter().enumerate() {
                if let Some(child) = child {
                    children.insert(index.to_string(), node_to_schema(tree, *child, catalog));
                }
            }
            NodeKindSchema::Vector {
                attribute: *attribute,
                centroids: centroids.clone(),
            }
        }
    };

    NodeSchema {
        kind,
        class: label_of(catalog, node.class()),
        weights,
        counts,
        children,
    }
}

/// Serialize a projector back into its schema form.
pub fn projector_to_schema(projector: &Projector, class_list: &[String]) -> ProjectorSchema {
    ProjectorSchema {
        class_list: class_list.to_vec(),
        stats: projector
            .stats()
            .into_iter()
            .map(|(mean, std)| AttributeStatsSchema { mean, std })
            .collect(),
        basis: projector
            .basis()
            .rows()
            .into_iter()
            .map(|row| row.to_vec())
            .collect(),
        target_dim: projector.target_dim(),
    }
}
