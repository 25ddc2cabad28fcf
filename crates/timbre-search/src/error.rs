//! Workflow error types.

use thiserror::Error;
use timbre_audio::AudioError;
use timbre_core::model::RecordIndex;

/// Errors that abort a song-to-neighbour request.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Catalog lookup or data validation failed.
    #[error(transparent)]
    Core(#[from] timbre_core::Error),

    /// The catalog knows the record but the backend does not.
    #[error("record {index} is in the catalog but missing from the vector backend")]
    RecordMissing { index: RecordIndex },

    /// The backend could not be reached or is failing.
    #[error("vector backend unavailable: {message}")]
    BackendUnavailable { message: String },

    /// The backend refused the request.
    #[error("vector backend rejected the request ({status}): {message}")]
    BackendRejected { status: u16, message: String },

    /// The backend answered with something we cannot use.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    /// A query vector does not match the collection's dimensionality.
    #[error("embedding dimension mismatch: collection stores {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Extracting an embedding needs a model and none is configured.
    #[error("no embedding model configured (set model_endpoint)")]
    ModelUnavailable,

    /// Decoding, fetching, or embedding audio failed.
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),
}

impl WorkflowError {
    /// Returns `true` when the error is transient and the request may
    /// succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }

    /// Returns `true` for lookup and integrity failures: the selection
    /// cannot be served and retrying will not help.
    pub fn is_lookup_failure(&self) -> bool {
        match self {
            Self::Core(e) => e.is_lookup_failure(),
            Self::RecordMissing { .. } => true,
            _ => false,
        }
    }
}

/// Convenience alias for workflow results.
pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let unavailable = WorkflowError::BackendUnavailable {
            message: "connection refused".to_string(),
        };
        assert!(unavailable.is_transient());
        assert!(!unavailable.is_lookup_failure());

        let missing = WorkflowError::RecordMissing {
            index: RecordIndex::new(3),
        };
        assert!(missing.is_lookup_failure());
        assert!(!missing.is_transient());

        let not_found = WorkflowError::from(timbre_core::Error::NotFound {
            label: "x".to_string(),
        });
        assert!(not_found.is_lookup_failure());

        let invalid = WorkflowError::from(timbre_core::Error::InvalidData("bad".to_string()));
        assert!(!invalid.is_lookup_failure());
    }
}
