//! Class label catalog.
//!
//! Labels are interned to dense [`ClassId`]s so per-node distributions can
//! be stored as compact `(id, weight)` pairs instead of string maps. The
//! catalog also fixes the output ordering: the *listed* block (the first
//! `n_listed` entries) is the closed class list that confidence vectors
//! align to. Labels that only occur inside leaf distributions are interned
//! after the listed block and never surface in classifier output; their
//! ensemble mass is silently dropped, which keeps the reported confidences
//! identical to the behavior already-trained models were built against.

use std::collections::HashMap;

use thiserror::Error;

/// Dense identifier for an interned class label.
pub type ClassId = u32;

/// Raised when a supplied class list repeats a label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate class label {0:?} in class list")]
pub struct DuplicateClassLabel(pub String);

/// Interned class labels with a fixed listed block.
#[derive(Debug, Clone, Default)]
pub struct ClassCatalog {
    labels: Vec<String>,
    by_label: HashMap<String, ClassId>,
    n_listed: usize,
}

impl ClassCatalog {
    /// Empty catalog. Grow it with [`intern_listed`](Self::intern_listed)
    /// (class-list deduction) or seed it with
    /// [`from_class_list`](Self::from_class_list).
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog from a fixed class list.
    ///
    /// The list order becomes the confidence-vector order. Duplicates are a
    /// fatal load error.
    pub fn from_class_list<I, S>(labels: I) -> Result<Self, DuplicateClassLabel>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::new();
        for label in labels {
            let label = label.into();
            if catalog.by_label.contains_key(&label) {
                return Err(DuplicateClassLabel(label));
            }
            catalog.intern_listed(&label);
        }
        Ok(catalog)
    }

    /// Intern a label into the listed block.
    ///
    /// Used while deducing a class list from tree leaves; must not be
    /// called once unlisted labels exist.
    pub fn intern_listed(&mut self, label: &str) -> ClassId {
        debug_assert_eq!(
            self.n_listed,
            self.labels.len(),
            "listed block must stay contiguous"
        );
        if let Some(&id) = self.by_label.get(label) {
            return id;
        }
        let id = self.labels.len() as ClassId;
        self.labels.push(label.to_string());
        self.by_label.insert(label.to_string(), id);
        self.n_listed += 1;
        id
    }

    /// Intern a label, appending it after the listed block if unseen.
    pub fn intern(&mut self, label: &str) -> ClassId {
        if let Some(&id) = self.by_label.get(label) {
            return id;
        }
        let id = self.labels.len() as ClassId;
        self.labels.push(label.to_string());
        self.by_label.insert(label.to_string(), id);
        id
    }

    /// Look up the id of a label, if interned.
    pub fn id(&self, label: &str) -> Option<ClassId> {
        self.by_label.get(label).copied()
    }

    /// Look up a label by id.
    pub fn label(&self, id: ClassId) -> Option<&str> {
        self.labels.get(id as usize).map(String::as_str)
    }

    /// The fixed ordered class list confidence vectors align to.
    pub fn class_list(&self) -> &[String] {
        &self.labels[..self.n_listed]
    }

    /// Number of listed classes (= confidence vector length).
    pub fn n_listed(&self) -> usize {
        self.n_listed
    }

    /// Total number of interned labels, listed and unlisted.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether an id belongs to the listed block.
    pub fn is_listed(&self, id: ClassId) -> bool {
        (id as usize) < self.n_listed
    }
}
