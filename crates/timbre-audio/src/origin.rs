use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::error::{AudioError, AudioResult};

/// HTTP client for the servers that host song audio.
#[derive(Debug, Clone)]
pub struct AudioOrigin {
    http: Client,
}

impl AudioOrigin {
    /// Create a new audio-origin client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(timeout: Duration) -> AudioResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("timbre/0.1.0 (https://github.com/oxur/timbre)")
            .build()?;
        Ok(Self { http })
    }

    /// Find out what `url` serves without downloading it.
    ///
    /// Sends a HEAD request. Origins that refuse HEAD (405 or 501) are
    /// asked again with a GET, whose unread response is kept so a later
    /// download does not need a second request.
    ///
    /// Transport failures and other non-success statuses are reported as
    /// [`AudioError::Unreachable`].
    pub async fn inspect(&self, url: &str) -> AudioResult<Inspection> {
        let response = self
            .http
            .head(url)
            .send()
            .await
            .map_err(|e| AudioError::unreachable(url, e))?;

        if matches!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
        ) {
            log::debug!("{} refused HEAD ({}), using GET", url, response.status());
            let response = self.open(url).await?;
            return Ok(Inspection {
                content_type: content_type(&response),
                opened: Some(response),
            });
        }

        let response = response
            .error_for_status()
            .map_err(|e| AudioError::unreachable(url, e))?;
        Ok(Inspection {
            content_type: content_type(&response),
            opened: None,
        })
    }

    /// Issue a GET for `url` without reading the body.
    ///
    /// Transport failures and non-success statuses are reported as
    /// [`AudioError::Unreachable`].
    pub async fn open(&self, url: &str) -> AudioResult<Response> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AudioError::unreachable(url, e))?;

        response
            .error_for_status()
            .map_err(|e| AudioError::unreachable(url, e))
    }

    /// Download the audio at `url`, reusing the GET an [`Inspection`]
    /// already opened.
    pub async fn download(&self, url: &str, inspection: Inspection) -> AudioResult<Vec<u8>> {
        let response = match inspection.opened {
            Some(response) => response,
            None => self.open(url).await?,
        };
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AudioError::unreachable(url, e))?;
        Ok(bytes.to_vec())
    }
}

/// What [`AudioOrigin::inspect`] learned about a resource.
#[derive(Debug)]
pub struct Inspection {
    /// Normalised media type, if the origin sent one.
    pub content_type: Option<String>,
    opened: Option<Response>,
}

/// The media type of a response, without parameters, lower-cased.
pub fn content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(normalise_media_type)
}

pub(crate) fn normalise_media_type(raw: &str) -> String {
    raw.split(';').next().unwrap_or(raw).trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_creation() {
        assert!(AudioOrigin::new(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_normalise_media_type() {
        assert_eq!(normalise_media_type("Audio/MPEG; charset=binary"), "audio/mpeg");
        assert_eq!(normalise_media_type("audio/wav"), "audio/wav");
    }
}
