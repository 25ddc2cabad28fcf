//! Embedding retrieval for a resolved seed.
//!
//! Catalog songs already have a vector in the backend and are fetched by
//! id. Uploaded clips are decoded, resampled to the model's rate, and run
//! through the embedding model; the mean of the last hidden state is the
//! clip's vector.

use std::sync::Arc;

use timbre_audio::model::{mean_pool, rank_genres};
use timbre_audio::{decode_bytes, EmbeddingModel, FeatureExtractor, GenreScore};
use timbre_core::model::{CatalogRecord, EmbeddingVector, Payload, Provenance};
use timbre_core::{Seed, UploadedClip};

use crate::backend::VectorBackend;
use crate::error::{WorkflowError, WorkflowResult};

/// A seed's embedding plus what came with it.
#[derive(Debug, Clone)]
pub struct FetchedVector {
    pub vector: EmbeddingVector,
    /// Stored metadata, for catalog songs.
    pub payload: Option<Payload>,
    /// Genre predictions, best first, for uploaded clips. Informational only.
    pub genres: Vec<GenreScore>,
    pub provenance: Provenance,
}

/// Obtains embedding vectors for catalog songs and uploaded clips.
#[derive(Debug, Clone)]
pub struct VectorFetcher {
    backend: Arc<dyn VectorBackend>,
    collection: String,
    model: Option<Arc<dyn EmbeddingModel>>,
    extractor: FeatureExtractor,
}

impl VectorFetcher {
    pub fn new(backend: Arc<dyn VectorBackend>, collection: impl Into<String>) -> Self {
        Self {
            backend,
            collection: collection.into(),
            model: None,
            extractor: FeatureExtractor::default(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: Arc<dyn EmbeddingModel>) -> Self {
        self.model = Some(model);
        self
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: FeatureExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub async fn fetch(&self, seed: &Seed) -> WorkflowResult<FetchedVector> {
        match seed {
            Seed::Catalog(record) => self.fetch_indexed(record).await,
            Seed::Upload(clip) => self.extract_upload(clip).await,
        }
    }

    async fn fetch_indexed(&self, record: &CatalogRecord) -> WorkflowResult<FetchedVector> {
        let points = self
            .backend
            .retrieve(&self.collection, &[record.index], true, true)
            .await?;

        let point = points
            .into_iter()
            .find(|p| p.id == record.index)
            .ok_or(WorkflowError::RecordMissing {
                index: record.index,
            })?;

        let vector = point.vector.ok_or_else(|| {
            WorkflowError::InvalidResponse(format!(
                "backend returned record {} without a vector",
                record.index
            ))
        })?;

        if let Some(payload) = &point.payload {
            if payload.name != record.name || payload.artist != record.artist {
                log::warn!(
                    "Backend payload for {} ('{}') disagrees with catalog ('{}')",
                    record.index,
                    payload.display_label(),
                    record.display_label
                );
            }
        }

        log::debug!(
            "Fetched {}-d vector for {} ({})",
            vector.dimension(),
            record.index,
            record.display_label
        );

        Ok(FetchedVector {
            vector,
            payload: point.payload,
            genres: Vec::new(),
            provenance: Provenance::Indexed(record.index),
        })
    }

    async fn extract_upload(&self, clip: &UploadedClip) -> WorkflowResult<FetchedVector> {
        let model = self.model.as_ref().ok_or(WorkflowError::ModelUnavailable)?;

        let decoded = decode_bytes(clip.bytes.clone(), clip.extension(), self.extractor.sampling_rate)?;
        log::info!(
            "Decoded upload {} ({:.1}s at {} Hz)",
            clip.file_name,
            decoded.duration_secs,
            decoded.sample_rate
        );

        let input = self.extractor.prepare(&decoded.samples);
        let hidden = model.hidden_states(&input, decoded.sample_rate).await?;
        let vector = EmbeddingVector::new(mean_pool(&hidden)?)?;

        let expected = self.backend.dimension(&self.collection).await?;
        if vector.dimension() != expected {
            return Err(WorkflowError::DimensionMismatch {
                expected,
                actual: vector.dimension(),
            });
        }

        let genres = match model.classify(&decoded.samples, decoded.sample_rate).await {
            Ok(genres) => rank_genres(genres),
            Err(e) => {
                log::warn!("Genre classification failed for {}: {}", clip.file_name, e);
                Vec::new()
            }
        };

        Ok(FetchedVector {
            vector,
            payload: None,
            genres,
            provenance: Provenance::External,
        })
    }
}
