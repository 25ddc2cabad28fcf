//! Qdrant REST client.
//!
//! Uses the HTTP API directly: `POST /collections/{c}/points` for
//! retrieval, `POST /collections/{c}/points/search` for similarity search,
//! and `GET /collections/{c}` for collection metadata. Every response is
//! wrapped in `{"result": ..., "status": ..., "time": ...}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use timbre_core::model::{EmbeddingVector, Payload, RecordIndex};

use super::{FieldMatch, ScoredPoint, StoredPoint, VectorBackend};
use crate::error::{WorkflowError, WorkflowResult};
use crate::resilience::RetryPolicy;

// ---------------------------------------------------------------------------
// Wire types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    id: u64,
    #[serde(default)]
    payload: Option<Payload>,
    #[serde(default)]
    vector: Option<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct WireScoredPoint {
    id: u64,
    score: f32,
    #[serde(default)]
    payload: Option<Payload>,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    config: CollectionConfig,
}

#[derive(Debug, Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Debug, Deserialize)]
struct CollectionParams {
    vectors: VectorParams,
}

#[derive(Debug, Deserialize)]
struct VectorParams {
    size: usize,
}

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    vector: &'a [f32],
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
    limit: usize,
    with_payload: bool,
}

fn filter_json(filter: &FieldMatch) -> Value {
    json!({
        "must": [
            { "key": filter.key, "match": { "value": filter.value } }
        ]
    })
}

fn into_stored(record: WireRecord) -> WorkflowResult<StoredPoint> {
    let vector = record
        .vector
        .map(EmbeddingVector::new)
        .transpose()
        .map_err(|e| WorkflowError::InvalidResponse(format!("point {}: {e}", record.id)))?;
    Ok(StoredPoint {
        id: RecordIndex::new(record.id),
        vector,
        payload: record.payload,
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// [`VectorBackend`] talking to a Qdrant server.
///
/// The connection is opened once and reused for the process lifetime.
/// Transport failures, 429, and 5xx responses are retried according to
/// the configured [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct QdrantClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl QdrantClient {
    /// Create a client for the Qdrant server at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> WorkflowResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("timbre/0.1.0 (https://github.com/oxur/timbre)")
            .build()
            .map_err(|e| WorkflowError::BackendUnavailable {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            retry,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> WorkflowResult<T> {
        self.retry
            .run(path, || self.request_once(method.clone(), path, body))
            .await
    }

    async fn request_once<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> WorkflowResult<T> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("{} {}", method, url);

        let mut builder = self.http.request(method, &url);
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| WorkflowError::BackendUnavailable {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            let envelope: Envelope<T> = response
                .json()
                .await
                .map_err(|e| WorkflowError::InvalidResponse(e.to_string()))?;
            return Ok(envelope.result);
        }

        let message = response.text().await.unwrap_or_default();
        Err(classify_status(status, message))
    }
}

fn classify_status(status: StatusCode, message: String) -> WorkflowError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        WorkflowError::BackendUnavailable {
            message: format!("{status}: {message}"),
        }
    } else {
        WorkflowError::BackendRejected {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl VectorBackend for QdrantClient {
    async fn retrieve(
        &self,
        collection: &str,
        ids: &[RecordIndex],
        with_payload: bool,
        with_vectors: bool,
    ) -> WorkflowResult<Vec<StoredPoint>> {
        let ids: Vec<u64> = ids.iter().map(|id| id.get()).collect();
        let body = json!({
            "ids": ids,
            "with_payload": with_payload,
            "with_vector": with_vectors,
        });

        let records: Vec<WireRecord> = self
            .request(
                Method::POST,
                &format!("/collections/{collection}/points"),
                Some(&body),
            )
            .await?;

        records.into_iter().map(into_stored).collect()
    }

    async fn search(
        &self,
        collection: &str,
        vector: &EmbeddingVector,
        filter: Option<&FieldMatch>,
        limit: usize,
    ) -> WorkflowResult<Vec<ScoredPoint>> {
        let body = serde_json::to_value(SearchBody {
            vector: vector.as_slice(),
            filter: filter.map(filter_json),
            limit,
            with_payload: true,
        })
        .map_err(|e| WorkflowError::InvalidResponse(format!("unserialisable query: {e}")))?;

        let points: Vec<WireScoredPoint> = self
            .request(
                Method::POST,
                &format!("/collections/{collection}/points/search"),
                Some(&body),
            )
            .await?;

        Ok(points
            .into_iter()
            .map(|p| ScoredPoint {
                id: RecordIndex::new(p.id),
                score: p.score,
                payload: p.payload,
            })
            .collect())
    }

    async fn dimension(&self, collection: &str) -> WorkflowResult<usize> {
        let info: CollectionInfo = self
            .request(Method::GET, &format!("/collections/{collection}"), None)
            .await?;
        Ok(info.config.params.vectors.size)
    }
}
