//! Feature vector input types.
//!
//! A [`Sample`] is the fully formed feature vector handed to the
//! classifier by an external feature extractor. Attribute indices baked
//! into the trees at training time index directly into it, so accessors
//! fail fast on out-of-bounds indices or value-kind mismatches instead of
//! silently mis-indexing.

use thiserror::Error;

/// A single attribute value within a [`Sample`].
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    /// Real-valued attribute, tested by continuous splits and consumed by
    /// the projector.
    Number(f64),
    /// Categorical attribute, matched exactly by discrete splits.
    Category(String),
    /// Vector-valued attribute, routed by nearest centroid.
    Vector(Vec<f64>),
}

impl FeatureValue {
    /// Human-readable kind name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FeatureValue::Number(_) => "number",
            FeatureValue::Category(_) => "category",
            FeatureValue::Vector(_) => "vector",
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Category(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Category(value)
    }
}

impl From<Vec<f64>> for FeatureValue {
    fn from(value: Vec<f64>) -> Self {
        FeatureValue::Vector(value)
    }
}

/// Errors raised when a sample does not match the attribute layout the
/// model was trained against.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    /// A split references an attribute index past the end of the sample.
    #[error("attribute {attribute} out of bounds for sample of length {len}")]
    AttributeOutOfBounds { attribute: usize, len: usize },
    /// The value at an attribute has a different kind than the split expects.
    #[error("attribute {attribute} holds a {found} value but a {expected} was expected")]
    WrongValueKind {
        attribute: usize,
        expected: &'static str,
        found: &'static str,
    },
}

/// An ordered feature vector.
///
/// The length and per-attribute semantics are fixed by the trained model;
/// the sample itself is just positional storage with typed accessors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sample {
    values: Vec<FeatureValue>,
}

impl Sample {
    /// Create a sample from explicit feature values.
    pub fn new(values: Vec<FeatureValue>) -> Self {
        Self { values }
    }

    /// Create an all-numeric sample.
    ///
    /// This is the common case, and the only shape the projector accepts.
    pub fn from_numbers(values: &[f64]) -> Self {
        Self {
            values: values.iter().copied().map(FeatureValue::Number).collect(),
        }
    }

    /// Number of attributes in the sample.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the sample has no attributes.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the raw value at an attribute index.
    pub fn get(&self, attribute: usize) -> Result<&FeatureValue, SampleError> {
        self.values
            .get(attribute)
            .ok_or(SampleError::AttributeOutOfBounds {
                attribute,
                len: self.values.len(),
            })
    }

    /// Get a real-valued attribute.
    pub fn number(&self, attribute: usize) -> Result<f64, SampleError> {
        match self.get(attribute)? {
            FeatureValue::Number(x) => Ok(*x),
            other => Err(SampleError::WrongValueKind {
                attribute,
                expected: "number",
                found: other.kind(),
            }),
        }
    }

    /// Get a categorical attribute.
    pub fn category(&self, attribute: usize) -> Result<&str, SampleError> {
        match self.get(attribute)? {
            FeatureValue::Category(v) => Ok(v.as_str()),
            other => Err(SampleError::WrongValueKind {
                attribute,
                expected: "category",
                found: other.kind(),
            }),
        }
    }

    /// Get a vector-valued attribute.
    pub fn vector(&self, attribute: usize) -> Result<&[f64], SampleError> {
        match self.get(attribute)? {
            FeatureValue::Vector(v) => Ok(v.as_slice()),
            other => Err(SampleError::WrongValueKind {
                attribute,
                expected: "vector",
                found: other.kind(),
            }),
        }
    }

    /// Collect the sample as a plain numeric vector.
    ///
    /// Fails on the first non-numeric attribute. Used to feed the projector,
    /// which is only defined over real-valued features.
    pub fn as_numbers(&self) -> Result<Vec<f64>, SampleError> {
        self.values
            .iter()
            .enumerate()
            .map(|(attribute, value)| match value {
                FeatureValue::Number(x) => Ok(*x),
                other => Err(SampleError::WrongValueKind {
                    attribute,
                    expected: "number",
                    found: other.kind(),
                }),
            })
            .collect()
    }
}

impl FromIterator<FeatureValue> for Sample {
    fn from_iter<I: IntoIterator<Item = FeatureValue>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_accessor() {
        let sample = Sample::from_numbers(&[1.0, 2.5]);
        assert_eq!(sample.len(), 2);
        assert_eq!(sample.number(1).unwrap(), 2.5);
    }

    #[test]
    fn out_of_bounds_is_descriptive() {
        let sample = Sample::from_numbers(&[1.0]);
        let err = sample.number(3).unwrap_err();
        assert_eq!(
            err,
            SampleError::AttributeOutOfBounds { attribute: 3, len: 1 }
        );
    }

    #[test]
    fn kind_mismatch_is_descriptive() {
        let sample = Sample::new(vec![FeatureValue::from("loop")]);
        let err = sample.number(0).unwrap_err();
        assert_eq!(
            err,
            SampleError::WrongValueKind {
                attribute: 0,
                expected: "number",
                found: "category"
            }
        );
    }

    #[test]
    fn mixed_sample_accessors() {
        let sample = Sample::new(vec![
            FeatureValue::from(0.5),
            FeatureValue::from("ascender"),
            FeatureValue::from(vec![1.0, 2.0]),
        ]);
        assert_eq!(sample.number(0).unwrap(), 0.5);
        assert_eq!(sample.category(1).unwrap(), "ascender");
        assert_eq!(sample.vector(2).unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn as_numbers_rejects_non_numeric() {
        let sample = Sample::new(vec![FeatureValue::from(1.0), FeatureValue::from("x")]);
        assert!(sample.as_numbers().is_err());

        let sample = Sample::from_numbers(&[1.0, 2.0]);
        assert_eq!(sample.as_numbers().unwrap(), vec![1.0, 2.0]);
    }
}
