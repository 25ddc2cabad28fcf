use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::ids::RecordIndex;
use crate::model::record::Payload;
use crate::model::vector::EmbeddingVector;

/// Upper bound on the number of neighbours a single search may request.
pub const MAX_RESULTS: usize = 30;

/// Where a query vector came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Retrieved from the backend for an indexed catalog record. That
    /// record will match itself with the maximum score.
    Indexed(RecordIndex),
    /// Extracted from audio the backend has never seen.
    External,
}

/// A single nearest-neighbour request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub vector: EmbeddingVector,
    pub genre_filter: Option<String>,
    pub limit: usize,
}

impl SearchQuery {
    /// Build a query for at most `limit` results.
    ///
    /// `limit` must be in `1..=MAX_RESULTS`.
    pub fn new(vector: EmbeddingVector, limit: usize) -> Result<Self> {
        if limit == 0 || limit > MAX_RESULTS {
            return Err(Error::InvalidData(format!(
                "result limit must be between 1 and {MAX_RESULTS}, got {limit}"
            )));
        }
        Ok(Self {
            vector,
            genre_filter: None,
            limit,
        })
    }

    /// Restrict results to records whose genre equals `genre`.
    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre_filter = Some(genre.into());
        self
    }
}

/// Parse a user-supplied genre choice. Empty input and `none` mean "no filter".
#[must_use]
pub fn parse_genre_filter(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// One ranked neighbour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub index: RecordIndex,
    pub record: Payload,
    pub score: f32,
    /// 1-based position in the result list.
    pub rank: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector() -> EmbeddingVector {
        EmbeddingVector::new(vec![0.1, 0.2, 0.3]).unwrap()
    }

    #[test]
    fn test_query_limit_bounds() {
        assert!(SearchQuery::new(vector(), 0).is_err());
        assert!(SearchQuery::new(vector(), MAX_RESULTS + 1).is_err());
        assert!(SearchQuery::new(vector(), 1).is_ok());
        assert!(SearchQuery::new(vector(), MAX_RESULTS).is_ok());
    }

    #[test]
    fn test_query_with_genre() {
        let query = SearchQuery::new(vector(), 10).unwrap().with_genre("Folk");
        assert_eq!(query.genre_filter.as_deref(), Some("Folk"));
    }

    #[test]
    fn test_parse_genre_filter() {
        assert_eq!(parse_genre_filter("none"), None);
        assert_eq!(parse_genre_filter("None"), None);
        assert_eq!(parse_genre_filter("  "), None);
        assert_eq!(parse_genre_filter(" Jazz "), Some("Jazz".to_string()));
    }
}
