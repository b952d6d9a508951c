//! Schema types for model bundle serialization.
//!
//! These types provide a stable wire format independent of runtime types:
//! trees are stored recursively with string-keyed children (the layout the
//! original training pipeline emits), and the projector bundle carries the
//! class list alongside the normalization statistics. Conversion to the
//! runtime arena representation lives in [`super::convert`].
//!
//! All maps use `BTreeMap` for deterministic JSON output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kind tag and kind-specific payload of a serialized node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKindSchema {
    /// Terminal node.
    Leaf,
    /// Continuous split; children are keyed `"0"` (value <= threshold)
    /// and `"1"` (value > threshold).
    Continuous { attribute: usize, threshold: f64 },
    /// Discrete split; children are keyed by the raw attribute value.
    ///
    /// `values` lists the attribute values seen at training time. It is
    /// informational only; dispatch goes through the child keys.
    Discrete {
        attribute: usize,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        values: Vec<String>,
    },
    /// Vector split; children are keyed by the stringified centroid index.
    Vector {
        attribute: usize,
        centroids: Vec<Vec<f64>>,
    },
}

/// One serialized decision node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSchema {
    #[serde(flatten)]
    pub kind: NodeKindSchema,
    /// Majority class at this node.
    pub class: String,
    /// Per-class training sample weights.
    pub weights: BTreeMap<String, f64>,
    /// Per-class training sample counts.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub counts: BTreeMap<String, u64>,
    /// Children keyed per the kind's branch convention.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, NodeSchema>,
}

/// Serialized tree ensemble: roots paired index-aligned with boosting
/// weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSchema {
    pub trees: Vec<NodeSchema>,
    pub weights: Vec<f64>,
}

/// Per-attribute normalization statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeStatsSchema {
    pub mean: f64,
    pub std: f64,
}

/// Serialized projector bundle.
///
/// Carries the fixed class list; without a projector bundle the class list
/// is deduced from the trees at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectorSchema {
    pub class_list: Vec<String>,
    /// Aligned with raw attribute indices.
    pub stats: Vec<AttributeStatsSchema>,
    /// Basis vectors, each of raw-attribute dimensionality.
    pub basis: Vec<Vec<f64>>,
    pub target_dim: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_is_internally_tagged() {
        let node = NodeSchema {
            kind: NodeKindSchema::Continuous {
                attribute: 3,
                threshold: 1.5,
            },
            class: "A".to_string(),
            weights: BTreeMap::from([("A".to_string(), 1.0)]),
            counts: BTreeMap::new(),
            children: BTreeMap::new(),
        };
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains(r#""kind":"continuous""#));
        assert!(json.contains(r#""attribute":3"#));

        let parsed: NodeSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, node);
    }

    #[test]
    fn empty_maps_are_skipped() {
        let node = NodeSchema {
            kind: NodeKindSchema::Leaf,
            class: "A".to_string(),
            weights: BTreeMap::from([("A".to_string(), 2.0)]),
            counts: BTreeMap::new(),
            children: BTreeMap::new(),
        };
        let json = serde_json::to_string(&node).unwrap();
        assert!(!json.contains("children"));
        assert!(!json.contains("counts"));
    }

    #[test]
    fn leaf_without_counts_deserializes() {
        let json = r#"{"kind":"leaf","class":"x","weights":{"x":1.0}}"#;
        let parsed: NodeSchema = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.kind, NodeKindSchema::Leaf);
        assert!(parsed.counts.is_empty());
    }

    #[test]
    fn projector_roundtrip() {
        let schema = ProjectorSchema {
            class_list: vec!["a".to_string(), "b".to_string()],
            stats: vec![AttributeStatsSchema { mean: 0.5, std: 1.0 }],
            basis: vec![vec![1.0]],
            target_dim: 1,
        };
        let json = serde_json::to_string(&schema).unwrap();
        let parsed: ProjectorSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, schema);
    }
}
