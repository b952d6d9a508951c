//! Boosting-weighted ensemble aggregation.
//!
//! An [`Ensemble`] holds an ordered collection of trees, their
//! index-aligned boosting weights (alphas), and the class catalog the
//! output aligns to. It is immutable after load and may be shared
//! read-only across threads; classification touches no shared mutable
//! state.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::classes::{ClassCatalog, ClassId};
use crate::repr::{EvaluateError, Tree};
use crate::sample::Sample;

/// Errors raised while combining per-tree evaluations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    /// A tree failed to route the sample (bad sample or malformed model).
    #[error("tree {tree}: {error}")]
    Evaluate { tree: usize, error: EvaluateError },
    /// A tree terminated at a node whose distribution has zero total mass,
    /// which cannot be normalized. Malformed model.
    #[error("tree {tree} terminated at a node with zero total sample weight")]
    EmptyLeaf { tree: usize },
    /// The boosting weights sum to a non-positive value, so the fused
    /// distribution cannot be normalized. Malformed model.
    #[error("boosting weights sum to {total}, cannot normalize")]
    NonPositiveWeightSum { total: f64 },
}

/// Weighted ensemble of decision trees over a fixed class list.
#[derive(Debug, Clone)]
pub struct Ensemble {
    trees: Vec<Tree>,
    weights: Vec<f64>,
    catalog: ClassCatalog,
}

impl Ensemble {
    /// Assemble an ensemble from already-validated parts.
    ///
    /// Loading code enforces the tree/weight alignment before calling this;
    /// the assertion is a backstop for in-process construction.
    pub fn new(trees: Vec<Tree>, weights: Vec<f64>, catalog: ClassCatalog) -> Self {
        assert_eq!(
            trees.len(),
            weights.len(),
            "each tree needs exactly one boosting weight"
        );
        Self {
            trees,
            weights,
            catalog,
        }
    }

    /// Number of trees.
    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Borrow a tree by index.
    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    /// Iterate over trees with their boosting weights.
    pub fn trees_with_weights(&self) -> impl Iterator<Item = (&Tree, f64)> {
        self.trees.iter().zip(self.weights.iter().copied())
    }

    /// Boosting weights, index-aligned with the trees.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// The class catalog backing this ensemble.
    #[inline]
    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    /// The fixed ordered class list confidence vectors align to.
    #[inline]
    pub fn class_list(&self) -> &[String] {
        self.catalog.class_list()
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Combine per-tree leaf distributions into one normalized distribution
    /// over the classes observed during this evaluation.
    ///
    /// Each tree's terminal distribution is normalized by its own mass,
    /// scaled by the tree's boosting weight, and accumulated; the total is
    /// divided by the weight sum. Classes never observed are absent from
    /// the result (implicitly zero).
    pub fn probabilistic_classify(
        &self,
        sample: &Sample,
    ) -> Result<BTreeMap<ClassId, f64>, ClassifyError> {
        let mut combined: BTreeMap<ClassId, f64> = BTreeMap::new();
        let mut total_alpha = 0.0;

        for (tree_idx, (tree, alpha)) in self.trees_with_weights().enumerate() {
            let terminal = tree
                .terminal(sample)
                .map_err(|error| ClassifyError::Evaluate { tree: tree_idx, error })?;

            let mass = terminal.total_weight();
            if mass <= 0.0 {
                return Err(ClassifyError::EmptyLeaf { tree: tree_idx });
            }

            for &(class, weight) in terminal.weights() {
                *combined.entry(class).or_insert(0.0) += alpha * (weight / mass);
            }
            total_alpha += alpha;
        }

        if total_alpha <= 0.0 {
            return Err(ClassifyError::NonPositiveWeightSum { total: total_alpha });
        }
        for value in combined.values_mut() {
            *value /= total_alpha;
        }

        Ok(combined)
    }

    /// Produce the dense confidence vector aligned to the class list.
    ///
    /// Always exactly `class_list().len()` entries; classes absent from the
    /// probabilistic result are 0.0. Mass assigned to labels outside the
    /// class list is dropped, not redistributed.
    pub fn classify(&self, sample: &Sample) -> Result<Vec<f64>, ClassifyError> {
        let combined = self.probabilistic_classify(sample)?;
        let n = self.catalog.n_listed();
        let mut confidences = vec![0.0; n];
        for (class, value) in combined {
            if self.catalog.is_listed(class) {
                confidences[class as usize] = value;
            }
        }
        Ok(confidences)
    }
}
