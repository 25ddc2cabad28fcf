//! Nearest-neighbour song search for timbre.
//!
//! Turns a user selection into a ranked list of similar songs: the
//! selection is resolved against the catalog, its embedding is fetched
//! from (or extracted for) the vector backend, and the backend is queried
//! for neighbours.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod backend;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod resilience;
pub mod searcher;
pub mod view;
pub mod workflow;

pub use backend::{InMemoryBackend, QdrantClient, VectorBackend};
pub use config::Config;
pub use error::{WorkflowError, WorkflowResult};
pub use fetcher::{FetchedVector, VectorFetcher};
pub use searcher::{NeighborSearcher, SelfExclusion};
pub use view::ResultsView;
pub use workflow::{PlaybackStatus, Resolution, ResolutionWorkflow, ResultEntry, SearchRequest};
