//! Nearest-neighbour search with provenance-aware self-exclusion.

use std::sync::Arc;

use timbre_core::model::{Provenance, RecordIndex, SearchQuery, SearchResult};

use crate::backend::{FieldMatch, VectorBackend};
use crate::error::{WorkflowError, WorkflowResult};

/// Whether the seed's own point is removed from the results.
///
/// A vector fetched for an indexed song matches itself with the maximum
/// score; a vector extracted from an upload has no point of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfExclusion {
    Keep,
    Exclude(RecordIndex),
}

impl SelfExclusion {
    /// Exclusion for a vector of the given provenance. Uploads are never
    /// excluded, whatever `exclude_self` says.
    #[must_use]
    pub fn for_provenance(provenance: Provenance, exclude_self: bool) -> Self {
        match provenance {
            Provenance::Indexed(index) if exclude_self => Self::Exclude(index),
            _ => Self::Keep,
        }
    }
}

/// Queries the backend for songs similar to a vector.
#[derive(Debug, Clone)]
pub struct NeighborSearcher {
    backend: Arc<dyn VectorBackend>,
    collection: String,
}

impl NeighborSearcher {
    pub fn new(backend: Arc<dyn VectorBackend>, collection: impl Into<String>) -> Self {
        Self {
            backend,
            collection: collection.into(),
        }
    }

    /// Up to `query.limit` results in the backend's order, best first.
    ///
    /// With [`SelfExclusion::Exclude`] the seed's own point is dropped
    /// after the search, so at most `limit - 1` results remain when the
    /// seed was among them. No match for the filter is an empty list.
    pub async fn search(
        &self,
        query: &SearchQuery,
        exclusion: SelfExclusion,
    ) -> WorkflowResult<Vec<SearchResult>> {
        let filter = query.genre_filter.as_deref().map(FieldMatch::genre);
        let points = self
            .backend
            .search(&self.collection, &query.vector, filter.as_ref(), query.limit)
            .await?;

        if points.windows(2).any(|w| w[0].score < w[1].score) {
            log::warn!("Backend returned results out of score order");
        }

        let mut results = Vec::with_capacity(points.len());
        for point in points {
            if exclusion == SelfExclusion::Exclude(point.id) {
                log::debug!("Dropping self-match {}", point.id);
                continue;
            }
            let record = point.payload.ok_or_else(|| {
                WorkflowError::InvalidResponse(format!("result {} has no payload", point.id))
            })?;
            results.push(SearchResult {
                index: point.id,
                record,
                score: point.score,
                rank: results.len() + 1,
            });
        }

        log::info!(
            "Search returned {} results (limit {}, genre {})",
            results.len(),
            query.limit,
            query.genre_filter.as_deref().unwrap_or("any")
        );
        Ok(results)
    }
}
