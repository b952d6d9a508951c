//! Linear projector: per-attribute normalization plus fixed-basis
//! projection.
//!
//! Reduces a raw numeric feature vector to the lower-dimensional space the
//! trees were trained in. The basis is stored real-valued; any complex
//! component a PCA produced upstream was discarded before the bundle was
//! written.

use ndarray::{Array1, Array2};
use thiserror::Error;

/// Errors raised while projecting a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProjectError {
    /// The sample length does not match the fitted attribute count.
    #[error("sample has {found} attributes but the projector was fitted for {expected}")]
    LengthMismatch { expected: usize, found: usize },
}

/// Per-attribute normalization and projection onto a fixed basis.
///
/// Immutable after load; shares freely across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Projector {
    mean: Array1<f64>,
    std: Array1<f64>,
    /// One basis vector per row, `n_attributes` columns.
    basis: Array2<f64>,
    target_dim: usize,
}

impl Projector {
    /// Assemble a projector from already-validated parts.
    ///
    /// Loading code guarantees that every basis row has `stats.len()`
    /// columns and that at least `min(target_dim, stats.len())` basis
    /// vectors exist.
    pub(crate) fn new(stats: Vec<(f64, f64)>, basis: Array2<f64>, target_dim: usize) -> Self {
        debug_assert_eq!(basis.ncols(), stats.len());
        let (mean, std): (Vec<f64>, Vec<f64>) = stats.into_iter().unzip();
        Self {
            mean: Array1::from(mean),
            std: Array1::from(std),
            basis,
            target_dim,
        }
    }

    /// Number of raw attributes the projector was fitted for.
    #[inline]
    pub fn n_attributes(&self) -> usize {
        self.mean.len()
    }

    /// Requested output dimensionality (before clamping).
    #[inline]
    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    /// Effective output dimensionality: `target_dim` clamped to the raw
    /// attribute count.
    #[inline]
    pub fn output_dim(&self) -> usize {
        self.target_dim.min(self.n_attributes())
    }

    /// Per-attribute `(mean, std)` pairs, in raw attribute order.
    pub fn stats(&self) -> Vec<(f64, f64)> {
        self.mean
            .iter()
            .zip(self.std.iter())
            .map(|(&m, &s)| (m, s))
            .collect()
    }

    /// Basis vectors, one per row.
    #[inline]
    pub fn basis(&self) -> &Array2<f64> {
        &self.basis
    }

    /// Normalize the raw vector and project it onto the first
    /// [`output_dim`](Self::output_dim) basis vectors.
    ///
    /// Attributes with `std == 0` are mean-centered only, never divided.
    pub fn project(&self, raw: &[f64]) -> Result<Vec<f64>, ProjectError> {
        if raw.len() != self.n_attributes() {
            return Err(ProjectError::LengthMismatch {
                expected: self.n_attributes(),
                found: raw.len(),
            });
        }

        let mut normalized = Array1::from_iter(raw.iter().copied());
        normalized -= &self.mean;
        for (value, &std) in normalized.iter_mut().zip(self.std.iter()) {
            if std > 0.0 {
                *value /= std;
            }
        }

        let k = self.output_dim();
        Ok((0..k).map(|i| self.basis.row(i).dot(&normalized)).collect())
    }
}
