//! glyphboost: boosted decision-tree classification for handwritten symbols.
//!
//! Evaluates a pre-trained ensemble of C4.5-style decision trees combined
//! by boosting weights, with an optional linear (PCA-style) projection of
//! the raw feature vector. Training is out of scope; models are loaded
//! from a bundle and evaluated deterministically.
//!
//! # Key Types
//!
//! - [`Classifier`] - High-level entry point: load a bundle, classify samples
//! - [`Ensemble`] - Weighted tree ensemble producing confidence vectors
//! - [`Sample`] / [`FeatureValue`] - Feature vector input
//! - [`Projector`] - Optional normalization + fixed-basis projection
//!
//! # Classifying
//!
//! Load a model with [`Classifier::load`] (or build one from schema types
//! in [`persist`]), then call [`Classifier::classify`] to get a confidence
//! vector aligned to [`Classifier::class_list`]. Rank the result with
//! [`Classifier::most_probable_label`] or [`Classifier::top_n_labels`].
//!
//! The loaded model is immutable and may be shared read-only across
//! threads; [`Classifier::classify_batch`] runs independent samples in
//! parallel via [`Parallelism`].

// Re-export approx traits for users who want to compare confidence vectors
pub use approx;

pub mod classes;
pub mod ensemble;
pub mod model;
pub mod persist;
pub mod projection;
pub mod ranking;
pub mod repr;
pub mod sample;
pub mod testing;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// High-level classifier (most users only need this)
pub use model::{Classifier, ClassifierError};

// Input types
pub use sample::{FeatureValue, Sample, SampleError};

// Core evaluation types
pub use classes::{ClassCatalog, ClassId};
pub use ensemble::{ClassifyError, Ensemble};
pub use projection::{ProjectError, Projector};
pub use ranking::{most_probable_label, top_n_labels, RankError};
pub use repr::{EvaluateError, Tree};

// Bundle loading
pub use persist::{LoadError, SaveError};

// Shared utilities
pub use utils::{run_with_threads, Parallelism};
