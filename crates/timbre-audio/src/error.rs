//! Audio error types.

use thiserror::Error;

/// Errors raised while fetching, decoding, or embedding audio.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The audio origin could not be reached or refused the request.
    #[error("audio unreachable at {url}: {message}")]
    Unreachable { url: String, message: String },

    /// The bytes are not audio symphonia can decode.
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// Writing the re-encoded WAV failed.
    #[error("failed to encode audio: {0}")]
    Encode(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedding model failed or returned unusable output.
    #[error("model error: {0}")]
    Model(String),

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}

impl AudioError {
    pub(crate) fn unreachable(url: &str, message: impl ToString) -> Self {
        Self::Unreachable {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    /// Returns `true` when the resource itself could not be retrieved.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// Convenience alias for audio results.
pub type AudioResult<T> = std::result::Result<T, AudioError>;
