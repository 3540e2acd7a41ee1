use thiserror::Error;

use crate::validator::Violation;

/// Failure kinds surfaced by profiling, schema loading and generation.
///
/// Statistical edge cases (empty columns, zero variance, a single category)
/// never show up here; they are recovered inside the profile itself.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed input at {location}: {detail}")]
    MalformedInput { location: String, detail: String },
    #[error("Unparseable schema document: {0}")]
    UnparseableSchema(#[from] serde_json::Error),
    #[error("Schema failed validation with {} violation(s)", .0.len())]
    ValidationFailure(Vec<Violation>),
}

impl Error {
    pub(crate) fn malformed(location: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::MalformedInput {
            location: location.into(),
            detail: detail.into(),
        }
    }

    /// Violations carried by a [`Error::ValidationFailure`], empty otherwise.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Error::ValidationFailure(violations) => violations,
            _ => &[],
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
