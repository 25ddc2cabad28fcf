use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use timbre_audio::{AudioOrigin, InferenceClient, NativeFormats, PlaybackResolver};
use timbre_core::Catalog;
use timbre_search::{Config, QdrantClient, ResolutionWorkflow, SearchRequest};

pub mod catalog;
pub mod config;
pub mod render;
pub mod similar;
pub mod upload;

pub use catalog::{list_genres, list_songs};
pub use similar::run_similar;
pub use upload::run_upload;

/// Global CLI flags that take precedence over config and environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub catalog: Option<PathBuf>,
    pub backend_url: Option<String>,
    pub collection: Option<String>,
}

impl Overrides {
    pub fn load_config(self) -> Result<Config> {
        let mut config = Config::load()?;
        if let Some(catalog) = self.catalog {
            config.catalog_path = catalog;
        }
        if let Some(backend_url) = self.backend_url {
            config.backend_url = backend_url;
        }
        if let Some(collection) = self.collection {
            config.collection = collection;
        }
        Ok(config)
    }
}

/// Per-search flags shared by `similar` and `upload`.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub genre: Option<String>,
    pub keep_self: bool,
    /// Resolve playable audio for each result.
    pub audio: bool,
}

impl SearchOptions {
    pub fn apply(&self, config: &Config, mut request: SearchRequest) -> SearchRequest {
        request = request.with_limit(self.limit.unwrap_or(config.default_limit));
        if let Some(genre) = &self.genre {
            request = request.with_genre(genre);
        }
        if self.keep_self {
            request = request.keep_self();
        }
        request
    }
}

pub fn load_catalog(config: &Config) -> Result<Catalog> {
    Catalog::load(&config.catalog_path).with_context(|| {
        format!(
            "Failed to load catalog from {}\n\nSet catalog_path in the config file or pass --catalog.",
            config.catalog_path.display()
        )
    })
}

/// Wire the workflow to the configured backend, model server, and player.
pub fn build_workflow(config: &Config, audio: bool) -> Result<ResolutionWorkflow> {
    let catalog = Arc::new(load_catalog(config)?);

    let backend = QdrantClient::new(
        config.backend_url.as_str(),
        config.api_key.clone(),
        config.request_timeout(),
        config.retry_policy(),
    )?;
    log::debug!("Using vector backend at {}", backend.base_url());

    let mut workflow = ResolutionWorkflow::new(catalog, Arc::new(backend), config.collection.as_str());

    if let Some(endpoint) = &config.model_endpoint {
        let model = InferenceClient::new(endpoint.as_str(), config.request_timeout())
            .context("Failed to create model client")?;
        workflow = workflow.with_model(Arc::new(model));
    }

    if audio {
        let origin = AudioOrigin::new(config.request_timeout())
            .context("Failed to create audio client")?;
        let resolver = PlaybackResolver::new(origin, Box::new(NativeFormats), config.cache_dir.as_path());
        workflow = workflow.with_playback(Arc::new(resolver));
    }

    Ok(workflow)
}
