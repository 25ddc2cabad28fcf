//! The song-to-neighbour workflow: resolve, fetch, search, and attach
//! playable audio to each result.

use std::sync::Arc;

use timbre_audio::tags::tag_upload;
use timbre_audio::{EmbeddingModel, GenreScore, PlaybackResolver, PlaybackSource};
use timbre_core::model::{parse_genre_filter, RecordIndex, SearchQuery, SearchResult};
use timbre_core::{Catalog, Seed, Selection, UploadedClip};

use crate::backend::VectorBackend;
use crate::error::WorkflowResult;
use crate::fetcher::VectorFetcher;
use crate::searcher::{NeighborSearcher, SelfExclusion};

/// Neighbours returned when a request does not say otherwise.
pub const DEFAULT_LIMIT: usize = 10;

/// One search, as the user asked for it.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub selection: Selection,
    pub limit: usize,
    pub genre: Option<String>,
    /// Drop the seed's own point from the results. Only meaningful for
    /// catalog songs; uploads are never in the backend.
    pub exclude_self: bool,
}

impl SearchRequest {
    #[must_use]
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            limit: DEFAULT_LIMIT,
            genre: None,
            exclude_self: true,
        }
    }

    #[must_use]
    pub fn label(label: impl Into<String>) -> Self {
        Self::new(Selection::Label(label.into()))
    }

    #[must_use]
    pub fn index(index: RecordIndex) -> Self {
        Self::new(Selection::Index(index))
    }

    #[must_use]
    pub fn upload(clip: UploadedClip) -> Self {
        Self::new(Selection::Upload(clip))
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Filter by genre. `"none"` and blank input clear the filter.
    #[must_use]
    pub fn with_genre(mut self, genre: &str) -> Self {
        self.genre = parse_genre_filter(genre);
        self
    }

    #[must_use]
    pub fn keep_self(mut self) -> Self {
        self.exclude_self = false;
        self
    }
}

/// Whether a song's audio can be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackStatus {
    Ready(PlaybackSource),
    /// Resolution failed; the message says why.
    Unavailable(String),
    /// No playback resolver is attached to the workflow.
    NotResolved,
}

impl PlaybackStatus {
    #[must_use]
    pub fn source(&self) -> Option<&PlaybackSource> {
        match self {
            Self::Ready(source) => Some(source),
            _ => None,
        }
    }
}

/// A search result with its playback status.
#[derive(Debug, Clone)]
pub struct ResultEntry {
    pub result: SearchResult,
    pub playback: PlaybackStatus,
}

/// Everything a finished request produced, ready to display.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub seed: Seed,
    /// Genre predictions for an uploaded seed, best first.
    pub genres: Vec<GenreScore>,
    pub seed_playback: PlaybackStatus,
    pub entries: Vec<ResultEntry>,
    pub limit: usize,
    pub genre_filter: Option<String>,
}

impl Resolution {
    pub fn results(&self) -> impl Iterator<Item = &SearchResult> {
        self.entries.iter().map(|e| &e.result)
    }

    #[must_use]
    pub fn best_genre(&self) -> Option<&GenreScore> {
        self.genres.first()
    }
}

/// Runs [`SearchRequest`]s against a catalog and a vector backend.
#[derive(Debug, Clone)]
pub struct ResolutionWorkflow {
    catalog: Arc<Catalog>,
    fetcher: VectorFetcher,
    searcher: NeighborSearcher,
    playback: Option<Arc<PlaybackResolver>>,
}

impl ResolutionWorkflow {
    pub fn new(
        catalog: Arc<Catalog>,
        backend: Arc<dyn VectorBackend>,
        collection: impl Into<String>,
    ) -> Self {
        let collection = collection.into();
        Self {
            catalog,
            fetcher: VectorFetcher::new(Arc::clone(&backend), collection.clone()),
            searcher: NeighborSearcher::new(backend, collection),
            playback: None,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: Arc<dyn EmbeddingModel>) -> Self {
        self.fetcher = self.fetcher.with_model(model);
        self
    }

    #[must_use]
    pub fn with_playback(mut self, playback: Arc<PlaybackResolver>) -> Self {
        self.playback = Some(playback);
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolve the selection, fetch its vector, and search for neighbours.
    ///
    /// Lookup failures, an unreachable backend, and invalid limits abort
    /// the request. Playback failures do not: they are reported per entry.
    pub async fn run(&self, request: SearchRequest) -> WorkflowResult<Resolution> {
        let SearchRequest {
            selection,
            limit,
            genre,
            exclude_self,
        } = request;

        let selection = match selection {
            Selection::Upload(clip) => Selection::Upload(tag_upload(clip)),
            other => other,
        };
        let seed = self.catalog.resolve(selection)?;
        log::info!("Resolved selection to {}", seed.label());

        let fetched = self.fetcher.fetch(&seed).await?;

        let mut query = SearchQuery::new(fetched.vector, limit)?;
        if let Some(genre) = &genre {
            query = query.with_genre(genre.clone());
        }
        let exclusion = SelfExclusion::for_provenance(fetched.provenance, exclude_self);
        let results = self.searcher.search(&query, exclusion).await?;

        let seed_playback = match &seed {
            Seed::Catalog(record) => self.playback_status(&record.audio_url).await,
            Seed::Upload(clip) => self.clip_playback_status(clip),
        };

        let mut entries = Vec::with_capacity(results.len());
        for result in results {
            let playback = self.playback_status(&result.record.audio_url).await;
            entries.push(ResultEntry { result, playback });
        }

        Ok(Resolution {
            seed,
            genres: fetched.genres,
            seed_playback,
            entries,
            limit,
            genre_filter: genre,
        })
    }

    async fn playback_status(&self, url: &str) -> PlaybackStatus {
        let Some(playback) = &self.playback else {
            return PlaybackStatus::NotResolved;
        };
        match playback.resolve(url).await {
            Ok(source) => PlaybackStatus::Ready(source),
            Err(e) => {
                log::warn!("No playable audio for {}: {}", url, e);
                PlaybackStatus::Unavailable(e.to_string())
            }
        }
    }

    fn clip_playback_status(&self, clip: &UploadedClip) -> PlaybackStatus {
        let Some(playback) = &self.playback else {
            return PlaybackStatus::NotResolved;
        };
        match playback.resolve_clip(clip) {
            Ok(source) => PlaybackStatus::Ready(source),
            Err(e) => {
                log::warn!("No playable audio for upload {}: {}", clip.file_name, e);
                PlaybackStatus::Unavailable(e.to_string())
            }
        }
    }
}
