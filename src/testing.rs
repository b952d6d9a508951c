//! Test fixtures: compact builders for model bundle schemas.
//!
//! Used by unit and integration tests to hand-build small trees without
//! spelling out every schema field. Counts default to one sample per
//! class; tests that care about counts set them explicitly.

use std::collections::BTreeMap;

use crate::persist::schema::{
    AttributeStatsSchema, EnsembleSchema, NodeKindSchema, NodeSchema, ProjectorSchema,
};

/// Per-class weight map from label/weight pairs.
pub fn weights(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|&(label, w)| (label.to_string(), w))
        .collect()
}

fn unit_counts(entries: &[(&str, f64)]) -> BTreeMap<String, u64> {
    entries
        .iter()
        .map(|&(label, _)| (label.to_string(), 1))
        .collect()
}

/// A leaf node with the given majority class and weight distribution.
pub fn leaf(class: &str, dist: &[(&str, f64)]) -> NodeSchema {
    NodeSchema {
        kind: NodeKindSchema::Leaf,
        class: class.to_string(),
        weights: weights(dist),
        counts: unit_counts(dist),
        children: BTreeMap::new(),
    }
}

/// A continuous split: `below` on `value <= threshold`, `above` otherwise.
pub fn continuous(
    attribute: usize,
    threshold: f64,
    class: &str,
    dist: &[(&str, f64)],
    below: NodeSchema,
    above: NodeSchema,
) -> NodeSchema {
    NodeSchema {
        kind: NodeKindSchema::Continuous {
            attribute,
            threshold,
        },
        class: class.to_string(),
        weights: weights(dist),
        counts: unit_counts(dist),
        children: BTreeMap::from([("0".to_string(), below), ("1".to_string(), above)]),
    }
}

/// A discrete split keyed by exact attribute value.
pub fn discrete(
    attribute: usize,
    class: &str,
    dist: &[(&str, f64)],
    branches: Vec<(&str, NodeSchema)>,
) -> NodeSchema {
    let values = branches.iter().map(|(v, _)| v.to_string()).collect();
    NodeSchema {
        kind: NodeKindSchema::Discrete { attribute, values },
        class: class.to_string(),
        weights: weights(dist),
        counts: unit_counts(dist),
        children: branches
            .into_iter()
            .map(|(v, node)| (v.to_string(), node))
            .collect(),
    }
}

/// A vector split; `branches[k]` becomes the child of centroid `k`.
pub fn vector(
    attribute: usize,
    centroids: Vec<Vec<f64>>,
    class: &str,
    dist: &[(&str, f64)],
    branches: Vec<NodeSchema>,
) -> NodeSchema {
    NodeSchema {
        kind: NodeKindSchema::Vector {
            attribute,
            centroids,
        },
        class: class.to_string(),
        weights: weights(dist),
        counts: unit_counts(dist),
        children: branches
            .into_iter()
            .enumerate()
            .map(|(k, node)| (k.to_string(), node))
            .collect(),
    }
}

/// An ensemble schema from (root, boosting weight) pairs.
pub fn ensemble(trees: Vec<(NodeSchema, f64)>) -> EnsembleSchema {
    let (trees, weights) = trees.into_iter().unzip();
    EnsembleSchema { trees, weights }
}

/// A projector schema from plain parts.
pub fn projector(
    class_list: &[&str],
    stats: &[(f64, f64)],
    basis: Vec<Vec<f64>>,
    target_dim: usize,
) -> ProjectorSchema {
    ProjectorSchema {
        class_list: class_list.iter().map(|s| s.to_string()).collect(),
        stats: stats
            .iter()
            .map(|&(mean, std)| AttributeStatsSchema { mean, std })
            .collect(),
        basis,
        target_dim,
    }
}
