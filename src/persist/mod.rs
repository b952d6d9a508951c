//! Model bundle persistence.
//!
//! A model bundle is one or two JSON documents: the tree ensemble
//! (required) and the projector parameters (optional). Loading is
//! all-or-nothing; see [`convert::LoadError`] for the failure taxonomy.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub mod convert;
pub mod schema;

pub use convert::{build_parts, ensemble_to_schema, projector_to_schema, LoadError};
pub use schema::{
    AttributeStatsSchema, EnsembleSchema, NodeKindSchema, NodeSchema, ProjectorSchema,
};

/// Errors raised while writing a model bundle.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to write model bundle")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize model bundle")]
    Json(#[from] serde_json::Error),
    /// The classifier carries a projector but no projector path was given.
    #[error("classifier has a projector but no projector path was supplied")]
    MissingProjectorPath,
}

/// Read and parse the ensemble document.
pub fn read_ensemble(path: impl AsRef<Path>) -> Result<EnsembleSchema, LoadError> {
    read_json(path.as_ref())
}

/// Read and parse the projector document.
pub fn read_projector(path: impl AsRef<Path>) -> Result<ProjectorSchema, LoadError> {
    read_json(path.as_ref())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SaveError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(path, bytes)?;
    Ok(())
}
