//! User-facing selections and the seeds they resolve to.

use std::fmt;

use crate::model::{CatalogRecord, Provenance, RecordIndex, LABEL_SEPARATOR};

/// What the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A display label, `"artist - name"`, or `"#<index>"`.
    Label(String),
    /// A stable catalog index.
    Index(RecordIndex),
    /// Raw audio the user uploaded.
    Upload(UploadedClip),
}

/// An uploaded audio clip. It has no catalog entry and no stable index.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedClip {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Title read from embedded tags, if any.
    pub title: Option<String>,
    /// Artist read from embedded tags, if any.
    pub artist: Option<String>,
}

impl UploadedClip {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            title: None,
            artist: None,
        }
    }

    #[must_use]
    pub fn with_tags(mut self, title: Option<String>, artist: Option<String>) -> Self {
        self.title = title;
        self.artist = artist;
        self
    }

    /// File extension, used as a format hint when decoding.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }

    #[must_use]
    pub fn label(&self) -> String {
        match (&self.artist, &self.title) {
            (Some(artist), Some(title)) => format!("{artist}{LABEL_SEPARATOR}{title}"),
            (None, Some(title)) => title.clone(),
            _ => self.file_name.clone(),
        }
    }
}

// Audio bytes are not useful in debug output.
impl fmt::Debug for UploadedClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedClip")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .field("title", &self.title)
            .field("artist", &self.artist)
            .finish()
    }
}

/// A resolved selection: the starting point of a similarity search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seed {
    Catalog(CatalogRecord),
    Upload(UploadedClip),
}

impl Seed {
    #[must_use]
    pub fn provenance(&self) -> Provenance {
        match self {
            Self::Catalog(record) => Provenance::Indexed(record.index),
            Self::Upload(_) => Provenance::External,
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Catalog(record) => record.display_label.clone(),
            Self::Upload(clip) => clip.label(),
        }
    }

    #[must_use]
    pub fn index(&self) -> Option<RecordIndex> {
        match self {
            Self::Catalog(record) => Some(record.index),
            Self::Upload(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploaded_clip_label_prefers_tags() {
        let clip = UploadedClip::new("demo.mp3", vec![0; 4]);
        assert_eq!(clip.label(), "demo.mp3");

        let tagged = clip
            .clone()
            .with_tags(Some("Night Drive".to_string()), Some("Me".to_string()));
        assert_eq!(tagged.label(), "Me - Night Drive");

        let title_only = clip.with_tags(Some("Night Drive".to_string()), None);
        assert_eq!(title_only.label(), "Night Drive");
    }

    #[test]
    fn test_uploaded_clip_extension() {
        assert_eq!(UploadedClip::new("a.b.flac", Vec::new()).extension(), Some("flac"));
        assert_eq!(UploadedClip::new("noext", Vec::new()).extension(), None);
        assert_eq!(UploadedClip::new("trailing.", Vec::new()).extension(), None);
    }

    #[test]
    fn test_seed_provenance() {
        let record = CatalogRecord::new(RecordIndex::new(9), "A", "B", "Rock", "u");
        assert_eq!(
            Seed::Catalog(record).provenance(),
            Provenance::Indexed(RecordIndex::new(9))
        );
        let upload = Seed::Upload(UploadedClip::new("x.wav", Vec::new()));
        assert_eq!(upload.provenance(), Provenance::External);
        assert_eq!(upload.index(), None);
    }

    #[test]
    fn test_debug_hides_bytes() {
        let clip = UploadedClip::new("x.wav", vec![1, 2, 3]);
        let debug = format!("{clip:?}");
        assert!(debug.contains("bytes: 3"));
    }
}
