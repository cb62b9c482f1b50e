use std::fmt;

use thiserror::Error;

use crate::record::Field;

/// Errors surfaced by adapters, the verifier and the runner.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HarnessError {
    #[error("Record not found: {id}")]
    NotFound { id: String },
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Equivalence mismatch: {0}")]
    EquivalenceMismatch(Box<Mismatch>),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Fixture error: {0}")]
    Fixture(String),
}

impl HarnessError {
    /// Whether the error should abort every remaining scenario of a run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HarnessError::BackendUnavailable(_))
    }
}

impl From<Mismatch> for HarnessError {
    fn from(mismatch: Mismatch) -> Self {
        HarnessError::EquivalenceMismatch(Box::new(mismatch))
    }
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Where an adapter's result diverged from the expected result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub adapter: String,
    pub operation: String,
    pub divergence: Divergence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Divergence {
    /// The result sets have different sizes.
    Length { expected: usize, actual: usize },
    /// After normalization, a different record sits at `index`.
    Identity {
        index: usize,
        expected_id: String,
        actual_id: String,
    },
    /// Same record, different field value.
    Field {
        index: usize,
        id: String,
        field: Field,
        expected: String,
        actual: String,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "adapter '{}' diverged on {}: {}",
            self.adapter, self.operation, self.divergence
        )
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::Length { expected, actual } => {
                write!(f, "expected {expected} records, got {actual}")
            }
            Divergence::Identity {
                index,
                expected_id,
                actual_id,
            } => write!(
                f,
                "record #{index} should be {expected_id}, got {actual_id}"
            ),
            Divergence::Field {
                index,
                id,
                field,
                expected,
                actual,
            } => write!(
                f,
                "field '{field}' of record #{index} ({id}) expected {expected}, got {actual}"
            ),
        }
    }
}
