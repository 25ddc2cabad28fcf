//! Playable audio for search results.
//!
//! A result's audio URL is first offered to the player as-is. Only when the
//! origin serves a format the player cannot handle is the audio downloaded
//! and re-encoded to a local WAV file. An origin that cannot be reached is
//! reported as such and never triggers the fallback. Uploaded clips have no
//! URL and are always re-encoded.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use sha2::{Digest, Sha256};
use timbre_core::UploadedClip;

use crate::decoder::decode_bytes;
use crate::encoder::encode_wav;
use crate::error::{AudioError, AudioResult};
use crate::origin::{AudioOrigin, Inspection};

/// Sample rate used for re-encoded playback files.
pub const PLAYBACK_SAMPLE_RATE: u32 = 22_050;

/// Where the player should read a song's audio from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackSource {
    /// The origin URL, streamable as-is.
    Direct(String),
    /// A local WAV re-encoded from the origin's bytes.
    Local(PathBuf),
}

impl fmt::Display for PlaybackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(url) => write!(f, "{url}"),
            Self::Local(path) => write!(f, "{} (re-encoded)", path.display()),
        }
    }
}

/// What the audio player can stream natively.
pub trait Player: Send + Sync + fmt::Debug {
    /// Whether the player can stream a resource with this media type.
    /// `content_type` is `None` when the origin did not send one.
    fn accepts(&self, content_type: Option<&str>, url: &str) -> bool;
}

/// Formats common audio players stream without help.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFormats;

const NATIVE_MEDIA_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/x-wav",
    "audio/wave",
    "audio/ogg",
    "audio/flac",
    "audio/x-flac",
    "audio/webm",
];

const NATIVE_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "oga", "flac", "webm"];

impl Player for NativeFormats {
    fn accepts(&self, content_type: Option<&str>, url: &str) -> bool {
        match content_type {
            // Generic binary types say nothing about the format.
            Some(ct) if ct != "application/octet-stream" => NATIVE_MEDIA_TYPES.contains(&ct),
            _ => url_extension(url)
                .is_some_and(|ext| NATIVE_EXTENSIONS.contains(&ext.to_lowercase().as_str())),
        }
    }
}

/// The extension of the last path segment of `url`, ignoring query and fragment.
fn url_extension(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    segment
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// Resolves audio URLs to playback sources, falling back to a local
/// re-encode at most once per URL.
#[derive(Debug)]
pub struct PlaybackResolver {
    origin: AudioOrigin,
    player: Box<dyn Player>,
    cache_dir: PathBuf,
    resolved: Mutex<HashMap<String, PlaybackSource>>,
    // Failure messages of fallbacks already attempted, keyed by URL.
    failed: Mutex<HashMap<String, String>>,
}

impl PlaybackResolver {
    pub fn new(origin: AudioOrigin, player: Box<dyn Player>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            origin,
            player,
            cache_dir: cache_dir.into(),
            resolved: Mutex::new(HashMap::new()),
            failed: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `url` to something the player can use.
    ///
    /// The origin is asked for the media type with a HEAD request; the
    /// audio is only downloaded when the player cannot stream it.
    ///
    /// # Errors
    /// Returns [`AudioError::Unreachable`] when the origin cannot serve the
    /// URL, or when the fallback cannot download, decode, or re-encode it.
    /// A failed fallback is remembered and not attempted again.
    pub async fn resolve(&self, url: &str) -> AudioResult<PlaybackSource> {
        if let Some(source) = self.lock_resolved().get(url) {
            return Ok(source.clone());
        }
        if let Some(message) = self.lock_failed().get(url) {
            return Err(AudioError::unreachable(url, message));
        }

        let inspection = self.origin.inspect(url).await?;
        let media_type = inspection.content_type.clone();

        if self.player.accepts(media_type.as_deref(), url) {
            let source = PlaybackSource::Direct(url.to_string());
            self.lock_resolved().insert(url.to_string(), source.clone());
            return Ok(source);
        }

        log::info!(
            "Player cannot stream {} ({}), re-encoding locally",
            url,
            media_type.as_deref().unwrap_or("no content type")
        );

        match self.fallback(url, inspection).await {
            Ok(source) => {
                self.lock_resolved().insert(url.to_string(), source.clone());
                Ok(source)
            }
            Err(e) => {
                log::warn!("Playback fallback failed for {}: {}", url, e);
                let message = match e {
                    AudioError::Unreachable { message, .. } => message,
                    other => format!("fallback failed: {other}"),
                };
                self.lock_failed().insert(url.to_string(), message.clone());
                Err(AudioError::unreachable(url, message))
            }
        }
    }

    /// Re-encode an uploaded clip to a local WAV the player can use.
    ///
    /// Clips with identical bytes share one file, which is written only once.
    ///
    /// # Errors
    /// Returns [`AudioError::Decode`] when the clip is not decodable audio,
    /// or an I/O or encode error when the WAV cannot be written.
    pub fn resolve_clip(&self, clip: &UploadedClip) -> AudioResult<PlaybackSource> {
        let path = self.clip_cache_path(&clip.bytes);
        if path.exists() {
            return Ok(PlaybackSource::Local(path));
        }

        let decoded = decode_bytes(clip.bytes.clone(), clip.extension(), PLAYBACK_SAMPLE_RATE)?;
        encode_wav(&path, &decoded.samples, decoded.sample_rate)?;
        log::debug!("Re-encoded upload {} to {}", clip.file_name, path.display());
        Ok(PlaybackSource::Local(path))
    }

    async fn fallback(&self, url: &str, inspection: Inspection) -> AudioResult<PlaybackSource> {
        let bytes = self.origin.download(url, inspection).await?;
        let decoded = decode_bytes(bytes, url_extension(url), PLAYBACK_SAMPLE_RATE)?;

        let path = self.cache_path(url);
        encode_wav(&path, &decoded.samples, decoded.sample_rate)?;
        Ok(PlaybackSource::Local(path))
    }

    /// Cache location of the re-encoded file for `url`.
    #[must_use]
    pub fn cache_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.cache_dir
            .join("playback")
            .join(format!("{digest:x}.wav"))
    }

    fn clip_cache_path(&self, bytes: &[u8]) -> PathBuf {
        let digest = Sha256::digest(bytes);
        self.cache_dir
            .join("playback")
            .join(format!("upload-{digest:x}.wav"))
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn lock_resolved(&self) -> std::sync::MutexGuard<'_, HashMap<String, PlaybackSource>> {
        self.resolved.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_failed(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.failed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_native_formats_by_content_type() {
        let player = NativeFormats;
        assert!(player.accepts(Some("audio/mpeg"), "https://a/x"));
        assert!(!player.accepts(Some("audio/x-ms-wma"), "https://a/x.mp3"));
        assert!(!player.accepts(Some("audio/aac"), "https://a/x"));
    }

    #[test]
    fn test_native_formats_by_extension() {
        let player = NativeFormats;
        assert!(player.accepts(None, "https://a/song.MP3?token=1"));
        assert!(player.accepts(Some("application/octet-stream"), "https://a/song.flac"));
        assert!(!player.accepts(None, "https://a/song.m4a"));
        assert!(!player.accepts(None, "https://a/stream"));
    }

    #[test]
    fn test_url_extension() {
        assert_eq!(url_extension("https://a.b/c/d.mp3"), Some("mp3"));
        assert_eq!(url_extension("https://a.b/c/d.ogg#t=3"), Some("ogg"));
        assert_eq!(url_extension("https://a.b/c/"), None);
    }

    #[test]
    fn test_cache_path_is_stable_per_url() {
        let origin = AudioOrigin::new(Duration::from_secs(1)).unwrap();
        let resolver = PlaybackResolver::new(origin, Box::new(NativeFormats), "/tmp/timbre");
        let a = resolver.cache_path("https://a/1.m4a");
        let b = resolver.cache_path("https://a/1.m4a");
        let c = resolver.cache_path("https://a/2.m4a");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("/tmp/timbre/playback"));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("wav"));
    }
}
