use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no catalog record matches '{label}'")]
    NotFound { label: String },

    #[error("'{label}' matches {count} catalog records")]
    AmbiguousRecord { label: String, count: usize },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Returns `true` when the error means the selection could not be
    /// mapped to exactly one catalog record.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::AmbiguousRecord { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
