use serde::{Deserialize, Serialize};

use crate::model::ids::RecordIndex;

/// Separator between artist and song name in a display label.
pub const LABEL_SEPARATOR: &str = " - ";

/// Song metadata stored alongside each vector in the backend.
///
/// The backend keeps the audio location under the `urls` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub artist: String,
    pub name: String,
    pub genre: String,
    #[serde(rename = "urls")]
    pub audio_url: String,
}

impl Payload {
    /// The `"artist - name"` label for this song.
    #[must_use]
    pub fn display_label(&self) -> String {
        format!("{}{}{}", self.artist, LABEL_SEPARATOR, self.name)
    }
}

/// A song in the reference catalog.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    pub index: RecordIndex,
    pub artist: String,
    pub name: String,
    pub genre: String,
    pub audio_url: String,
    pub display_label: String,
}

impl CatalogRecord {
    #[must_use]
    pub fn new(
        index: RecordIndex,
        artist: impl Into<String>,
        name: impl Into<String>,
        genre: impl Into<String>,
        audio_url: impl Into<String>,
    ) -> Self {
        let artist = artist.into();
        let name = name.into();
        let display_label = format!("{artist}{LABEL_SEPARATOR}{name}");
        Self {
            index,
            artist,
            name,
            genre: genre.into(),
            audio_url: audio_url.into(),
            display_label,
        }
    }

    /// The subset of the record the backend stores as payload.
    #[must_use]
    pub fn payload(&self) -> Payload {
        Payload {
            artist: self.artist.clone(),
            name: self.name.clone(),
            genre: self.genre.clone(),
            audio_url: self.audio_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label() {
        let record = CatalogRecord::new(
            RecordIndex::new(1),
            "Dave Van Ronk",
            "Buckets of Rain",
            "Folk",
            "https://example.com/1.mp3",
        );
        assert_eq!(record.display_label, "Dave Van Ronk - Buckets of Rain");
        assert_eq!(record.payload().display_label(), record.display_label);
    }

    #[test]
    fn test_payload_uses_urls_key() {
        let payload: Payload = serde_json::from_str(
            r#"{"artist":"A","name":"B","genre":"Rock","urls":"https://x/y.mp3","extra":1}"#,
        )
        .unwrap();
        assert_eq!(payload.audio_url, "https://x/y.mp3");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["urls"], "https://x/y.mp3");
    }
}
