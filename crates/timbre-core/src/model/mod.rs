pub mod ids;
pub mod query;
pub mod record;
pub mod vector;

pub use ids::RecordIndex;
pub use query::{parse_genre_filter, Provenance, SearchQuery, SearchResult, MAX_RESULTS};
pub use record::{CatalogRecord, Payload, LABEL_SEPARATOR};
pub use vector::EmbeddingVector;
