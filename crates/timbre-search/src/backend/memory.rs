//! In-process backend with brute-force cosine similarity.
//!
//! Scores are exact. Equal scores keep insertion order.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use async_trait::async_trait;
use timbre_core::model::{EmbeddingVector, Payload, RecordIndex};

use super::{FieldMatch, ScoredPoint, StoredPoint, VectorBackend};
use crate::error::{WorkflowError, WorkflowResult};

#[derive(Debug, Clone)]
struct Point {
    id: RecordIndex,
    vector: EmbeddingVector,
    payload: Payload,
}

/// A [`VectorBackend`] that keeps every collection in memory.
#[derive(Debug)]
pub struct InMemoryBackend {
    dimension: usize,
    collections: RwLock<HashMap<String, Vec<Point>>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Create an empty collection; a no-op if it exists.
    pub fn create_collection(&self, collection: &str) {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection.to_string())
            .or_default();
    }

    /// Insert or replace a point, creating the collection if needed.
    pub fn upsert(
        &self,
        collection: &str,
        id: RecordIndex,
        vector: EmbeddingVector,
        payload: Payload,
    ) -> WorkflowResult<()> {
        if vector.dimension() != self.dimension {
            return Err(WorkflowError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.dimension(),
            });
        }

        let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        let points = collections.entry(collection.to_string()).or_default();
        let point = Point { id, vector, payload };
        match points.iter_mut().find(|p| p.id == id) {
            Some(existing) => *existing = point,
            None => points.push(point),
        }
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<Point>>> {
        self.collections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn missing_collection(collection: &str) -> WorkflowError {
        WorkflowError::BackendRejected {
            status: 404,
            message: format!("collection '{collection}' not found"),
        }
    }
}

fn payload_field<'a>(payload: &'a Payload, key: &str) -> Option<&'a str> {
    match key {
        "artist" => Some(&payload.artist),
        "name" => Some(&payload.name),
        "genre" => Some(&payload.genre),
        "urls" => Some(&payload.audio_url),
        _ => None,
    }
}

#[async_trait]
impl VectorBackend for InMemoryBackend {
    async fn retrieve(
        &self,
        collection: &str,
        ids: &[RecordIndex],
        with_payload: bool,
        with_vectors: bool,
    ) -> WorkflowResult<Vec<StoredPoint>> {
        let collections = self.read();
        let points = collections
            .get(collection)
            .ok_or_else(|| Self::missing_collection(collection))?;

        Ok(ids
            .iter()
            .filter_map(|id| points.iter().find(|p| p.id == *id))
            .map(|p| StoredPoint {
                id: p.id,
                vector: with_vectors.then(|| p.vector.clone()),
                payload: with_payload.then(|| p.payload.clone()),
            })
            .collect())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &EmbeddingVector,
        filter: Option<&FieldMatch>,
        limit: usize,
    ) -> WorkflowResult<Vec<ScoredPoint>> {
        if vector.dimension() != self.dimension {
            return Err(WorkflowError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.dimension(),
            });
        }

        let collections = self.read();
        let points = collections
            .get(collection)
            .ok_or_else(|| Self::missing_collection(collection))?;

        let mut scored: Vec<ScoredPoint> = points
            .iter()
            .filter(|p| {
                filter.map_or(true, |f| payload_field(&p.payload, &f.key) == Some(f.value.as_str()))
            })
            .map(|p| ScoredPoint {
                id: p.id,
                score: vector.cosine_similarity(&p.vector),
                payload: Some(p.payload.clone()),
            })
            .collect();

        // Stable sort: ties stay in insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn dimension(&self, collection: &str) -> WorkflowResult<usize> {
        if self.read().contains_key(collection) {
            Ok(self.dimension)
        } else {
            Err(Self::missing_collection(collection))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, genre: &str) -> Payload {
        Payload {
            artist: "Artist".to_string(),
            name: name.to_string(),
            genre: genre.to_string(),
            audio_url: format!("https://audio.example/{name}.mp3"),
        }
    }

    fn vector(values: &[f32]) -> EmbeddingVector {
        EmbeddingVector::new(values.to_vec()).unwrap()
    }

    fn backend() -> InMemoryBackend {
        let backend = InMemoryBackend::new(2);
        backend
            .upsert("songs", RecordIndex::new(1), vector(&[1.0, 0.0]), payload("a", "Folk"))
            .unwrap();
        backend
            .upsert("songs", RecordIndex::new(2), vector(&[0.8, 0.6]), payload("b", "Jazz"))
            .unwrap();
        backend
            .upsert("songs", RecordIndex::new(3), vector(&[0.0, 1.0]), payload("c", "Folk"))
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_search_orders_by_score() {
        let results = backend()
            .search("songs", &vector(&[1.0, 0.0]), None, 10)
            .await
            .unwrap();
        let ids: Vec<u64> = results.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_search_filter_and_limit() {
        let backend = backend();
        let folk = FieldMatch::genre("Folk");
        let results = backend
            .search("songs", &vector(&[1.0, 0.0]), Some(&folk), 1)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, RecordIndex::new(1));

        let none = FieldMatch::genre("Polka");
        let empty = backend
            .search("songs", &vector(&[1.0, 0.0]), Some(&none), 10)
            .await
            .unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let backend = InMemoryBackend::new(1);
        for id in [5, 3, 9] {
            backend
                .upsert("t", RecordIndex::new(id), vector(&[1.0]), payload("x", "Folk"))
                .unwrap();
        }
        let results = backend.search("t", &vector(&[2.0]), None, 3).await.unwrap();
        let ids: Vec<u64> = results.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![5, 3, 9]);
    }

    #[tokio::test]
    async fn test_retrieve_flags_and_missing_ids() {
        let backend = backend();
        let points = backend
            .retrieve("songs", &[RecordIndex::new(2), RecordIndex::new(42)], true, false)
            .await
            .unwrap();
        assert_eq!(points.len(), 1);
        assert!(points[0].vector.is_none());
        assert_eq!(points[0].payload.as_ref().map(|p| p.name.as_str()), Some("b"));
    }

    #[tokio::test]
    async fn test_unknown_collection_and_dimension() {
        let backend = backend();
        assert_eq!(backend.dimension("songs").await.unwrap(), 2);
        assert!(matches!(
            backend.dimension("nope").await,
            Err(WorkflowError::BackendRejected { status: 404, .. })
        ));
        assert!(matches!(
            backend.search("songs", &vector(&[1.0]), None, 1).await,
            Err(WorkflowError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_upsert_replaces_existing_point() {
        let backend = backend();
        backend
            .upsert("songs", RecordIndex::new(1), vector(&[0.0, 1.0]), payload("a2", "Rock"))
            .unwrap();
        assert_eq!(backend.read().get("songs").map(Vec::len), Some(3));
    }
}
