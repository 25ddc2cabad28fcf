//! HTTP client for a local model-inference server.
//!
//! The server hosts the audio-classification model and answers two calls,
//! both taking `{"inputs": [f32], "sampling_rate": u32}`:
//!
//! - `POST {endpoint}/hidden-states` returns `{"last_hidden_state": [[f32]]}`
//! - `POST {endpoint}/classify` returns `[{"label": str, "score": f32}]`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AudioError, AudioResult};
use crate::model::{EmbeddingModel, GenreScore};

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a [f32],
    sampling_rate: u32,
}

#[derive(Debug, Deserialize)]
struct HiddenStatesResponse {
    last_hidden_state: Vec<Vec<f32>>,
}

/// [`EmbeddingModel`] backed by an inference server.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: Client,
    endpoint: String,
}

impl InferenceClient {
    /// Create a client for the server at `endpoint`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> AudioResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("timbre/0.1.0 (https://github.com/oxur/timbre)")
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        input: &[f32],
        sampling_rate: u32,
    ) -> AudioResult<T> {
        let url = format!("{}/{}", self.endpoint, path);
        log::debug!("POST {} ({} samples)", url, input.len());

        let response = self
            .http
            .post(&url)
            .json(&InferenceRequest {
                inputs: input,
                sampling_rate,
            })
            .send()
            .await
            .map_err(|e| AudioError::Model(format!("inference server unavailable: {e}")))?
            .error_for_status()
            .map_err(|e| AudioError::Model(format!("inference request failed: {e}")))?;

        response
            .json::<T>()
            .await
            .map_err(|e| AudioError::Model(format!("malformed inference response: {e}")))
    }
}

#[async_trait]
impl EmbeddingModel for InferenceClient {
    async fn hidden_states(&self, input: &[f32], sampling_rate: u32) -> AudioResult<Vec<Vec<f32>>> {
        let response: HiddenStatesResponse = self.call("hidden-states", input, sampling_rate).await?;
        Ok(response.last_hidden_state)
    }

    async fn classify(&self, input: &[f32], sampling_rate: u32) -> AudioResult<Vec<GenreScore>> {
        self.call("classify", input, sampling_rate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let client = InferenceClient::new("http://localhost:8500/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8500");
    }

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(InferenceRequest {
            inputs: &[0.5, -0.5],
            sampling_rate: 16_000,
        })
        .unwrap();
        assert_eq!(body["sampling_rate"], 16_000);
        assert_eq!(body["inputs"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_classify_response_parses() {
        let genres: Vec<GenreScore> =
            serde_json::from_str(r#"[{"label":"folk","score":0.91},{"label":"rock","score":0.05}]"#)
                .unwrap();
        assert_eq!(genres[0].label, "folk");
    }
}
