//! Error kinds raised by the ordering and aggregation routines.
//!
//! Public functions return `anyhow::Result`; the underlying error is always a
//! [`ReplicabilityError`], so callers can recover the kind with
//! `err.downcast_ref::<ReplicabilityError>()`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplicabilityError {
    /// Row/column counts or label vector lengths disagree.
    #[error("Shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// Row and column labels of a square matrix do not name the same clusters.
    #[error("Label mismatch: {0}")]
    LabelMismatch(String),

    /// A label contains the cluster separator, or an id has none.
    #[error("Ambiguous cluster identifier: {0:?}")]
    AmbiguousIdentifier(String),

    /// A sample has an empty group label.
    #[error("Missing group label at index {index}")]
    MissingLabel { index: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ReplicabilityError {
    pub fn shape_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    pub fn label_mismatch(message: impl Into<String>) -> Self {
        Self::LabelMismatch(message.into())
    }

    pub fn ambiguous(id: impl Into<String>) -> Self {
        Self::AmbiguousIdentifier(id.into())
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }
}
