//! High-level classifier.
//!
//! [`Classifier`] is the single ownership root for a loaded model: the
//! tree ensemble plus the optional projector. It is constructed once
//! (explicitly, from a bundle) and then only borrowed, so no global state
//! or locking is involved; the same instance serves arbitrarily many
//! concurrent classification calls.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use crate::classes::ClassId;
use crate::ensemble::{ClassifyError, Ensemble};
use crate::persist::{self, LoadError, SaveError};
use crate::projection::{ProjectError, Projector};
use crate::ranking::{self, RankError};
use crate::sample::{Sample, SampleError};
use crate::utils::Parallelism;

/// Errors raised by a full classification call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Sample(#[from] SampleError),
}

/// A loaded symbol classifier: weighted tree ensemble plus optional
/// linear projector.
#[derive(Debug, Clone)]
pub struct Classifier {
    ensemble: Ensemble,
    projector: Option<Projector>,
}

impl Classifier {
    /// Assemble a classifier from runtime parts.
    pub fn new(ensemble: Ensemble, projector: Option<Projector>) -> Self {
        Self {
            ensemble,
            projector,
        }
    }

    /// Build a classifier from schema types.
    ///
    /// All-or-nothing: any structural mismatch in either schema fails the
    /// whole construction.
    pub fn from_schemas(
        ensemble: persist::EnsembleSchema,
        projector: Option<persist::ProjectorSchema>,
    ) -> Result<Self, LoadError> {
        let (ensemble, projector) = persist::build_parts(ensemble, projector)?;
        Ok(Self::new(ensemble, projector))
    }

    /// Load a classifier from a bundle on disk.
    ///
    /// `projector_path` is optional; without it the class list is deduced
    /// from the trees and samples are fed to the ensemble unprojected.
    pub fn load(
        ensemble_path: impl AsRef<Path>,
        projector_path: Option<&Path>,
    ) -> Result<Self, LoadError> {
        let ensemble = persist::read_ensemble(ensemble_path)?;
        let projector = projector_path.map(persist::read_projector).transpose()?;
        Self::from_schemas(ensemble, projector)
    }

    /// Save the classifier as a bundle on disk.
    pub fn save(
        &self,
        ensemble_path: impl AsRef<Path>,
        projector_path: Option<&Path>,
    ) -> Result<(), SaveError> {
        let ensemble = persist::ensemble_to_schema(&self.ensemble);
        persist::write_json(ensemble_path.as_ref(), &ensemble)?;

        match (&self.projector, projector_path) {
            (Some(projector), Some(path)) => {
                let schema = persist::projector_to_schema(projector, self.class_list());
                persist::write_json(path, &schema)
            }
            (Some(_), None) => Err(SaveError::MissingProjectorPath),
            (None, _) => Ok(()),
        }
    }

    /// The fixed ordered class list confidence vectors align to.
    pub fn class_list(&self) -> &[String] {
        self.ensemble.class_list()
    }

    /// Borrow the underlying ensemble.
    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// Borrow the projector, if the bundle carried one.
    pub fn projector(&self) -> Option<&Projector> {
        self.projector.as_ref()
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Classify a raw sample into a dense confidence vector aligned to
    /// [`class_list`](Self::class_list).
    ///
    /// With a projector, the sample must be all-numeric and of the fitted
    /// raw dimensionality; it is projected before reaching the trees.
    pub fn classify(&self, sample: &Sample) -> Result<Vec<f64>, ClassifierError> {
        match &self.projector {
            Some(projector) => {
                let raw = sample.as_numbers()?;
                let projected = Sample::from_numbers(&projector.project(&raw)?);
                Ok(self.ensemble.classify(&projected)?)
            }
            None => Ok(self.ensemble.classify(sample)?),
        }
    }

    /// Classify a raw sample into a sparse distribution over the classes
    /// observed at the reached leaves.
    pub fn probabilistic_classify(
        &self,
        sample: &Sample,
    ) -> Result<BTreeMap<ClassId, f64>, ClassifierError> {
        match &self.projector {
            Some(projector) => {
                let raw = sample.as_numbers()?;
                let projected = Sample::from_numbers(&projector.project(&raw)?);
                Ok(self.ensemble.probabilistic_classify(&projected)?)
            }
            None => Ok(self.ensemble.probabilistic_classify(sample)?),
        }
    }

    /// Classify a batch of independent samples.
    ///
    /// The model is shared read-only across workers; each sample fully
    /// succeeds or fully fails on its own.
    pub fn classify_batch(
        &self,
        samples: &[Sample],
        parallelism: Parallelism,
    ) -> Vec<Result<Vec<f64>, ClassifierError>> {
        parallelism.maybe_par_map(samples, |sample| self.classify(sample))
    }

    // =========================================================================
    // Ranking
    // =========================================================================

    /// The best label and its confidence from a confidence vector.
    pub fn most_probable_label(
        &self,
        confidences: &[f64],
    ) -> Result<Option<(&str, f64)>, RankError> {
        ranking::most_probable_label(self.class_list(), confidences)
    }

    /// The top `n` labels by descending confidence.
    pub fn top_n_labels(
        &self,
        confidences: &[f64],
        n: usize,
    ) -> Result<Vec<(&str, f64)>, RankError> {
        ranking::top_n_labels(self.class_list(), confidences, n)
    }
}
