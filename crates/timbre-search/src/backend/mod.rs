//! The vector backend seam.
//!
//! The backend owns the vectors and the nearest-neighbour index. The
//! workflow only needs exact-key retrieval, filtered similarity search, and
//! the collection's dimensionality.

pub mod memory;
pub mod qdrant;

use std::fmt;

use async_trait::async_trait;
use timbre_core::model::{EmbeddingVector, Payload, RecordIndex};

use crate::error::WorkflowResult;

pub use memory::InMemoryBackend;
pub use qdrant::QdrantClient;

/// A point fetched by id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPoint {
    pub id: RecordIndex,
    /// Present only when vectors were requested.
    pub vector: Option<EmbeddingVector>,
    /// Present only when payloads were requested.
    pub payload: Option<Payload>,
}

/// A point returned by a similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: RecordIndex,
    pub score: f32,
    pub payload: Option<Payload>,
}

/// Equality condition on a payload field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub key: String,
    pub value: String,
}

impl FieldMatch {
    #[must_use]
    pub fn genre(value: impl Into<String>) -> Self {
        Self {
            key: "genre".to_string(),
            value: value.into(),
        }
    }
}

/// A nearest-neighbour service holding one vector and payload per song.
#[async_trait]
pub trait VectorBackend: Send + Sync + fmt::Debug {
    /// Fetch points by id. Unknown ids are silently absent from the result.
    async fn retrieve(
        &self,
        collection: &str,
        ids: &[RecordIndex],
        with_payload: bool,
        with_vectors: bool,
    ) -> WorkflowResult<Vec<StoredPoint>>;

    /// The `limit` points most similar to `vector`, best first, optionally
    /// restricted to points matching `filter`. Payloads are always included.
    async fn search(
        &self,
        collection: &str,
        vector: &EmbeddingVector,
        filter: Option<&FieldMatch>,
        limit: usize,
    ) -> WorkflowResult<Vec<ScoredPoint>>;

    /// Dimensionality of the vectors stored in `collection`.
    async fn dimension(&self, collection: &str) -> WorkflowResult<usize>;
}
