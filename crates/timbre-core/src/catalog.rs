//! The reference song catalog.
//!
//! The catalog is a CSV table with at least the columns `index`, `name`,
//! `artist`, `genre` and `urls`. It is loaded once at startup and is
//! read-only afterwards. Display labels are always derived as
//! `"artist - name"`, so a stored `artist_song` column is ignored.

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{CatalogRecord, RecordIndex, LABEL_SEPARATOR};
use crate::selection::{Seed, Selection};

#[derive(Debug, Deserialize)]
struct CatalogRow {
    index: u64,
    name: String,
    artist: String,
    genre: String,
    urls: String,
}

/// In-memory catalog of known songs keyed by their stable index.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Sorted by display label.
    records: Vec<CatalogRecord>,
    by_index: HashMap<RecordIndex, usize>,
}

impl Catalog {
    /// Build a catalog from records, rejecting duplicate indices.
    pub fn from_records(mut records: Vec<CatalogRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::InvalidData("catalog contains no records".to_string()));
        }

        records.sort_by(|a, b| {
            a.display_label
                .cmp(&b.display_label)
                .then(a.index.cmp(&b.index))
        });

        let mut by_index = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            if by_index.insert(record.index, pos).is_some() {
                return Err(Error::InvalidData(format!(
                    "duplicate catalog index {}",
                    record.index
                )));
            }
        }

        Ok(Self { records, by_index })
    }

    /// Load the catalog from a CSV file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading catalog from {}", path.display());
        let file = std::fs::File::open(path)?;
        let catalog = Self::from_reader(file)?;
        log::info!("Loaded {} catalog records", catalog.len());
        Ok(catalog)
    }

    /// Parse catalog CSV from any reader.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut records = Vec::new();
        for row in csv_reader.deserialize::<CatalogRow>() {
            let row = row?;
            records.push(CatalogRecord::new(
                RecordIndex::new(row.index),
                row.artist,
                row.name,
                row.genre,
                row.urls,
            ));
        }

        Self::from_records(records)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, ordered by display label.
    #[must_use]
    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    /// Display labels in the order the selection control presents them.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.display_label.as_str()).collect()
    }

    /// Labels containing `needle`, case-insensitively.
    #[must_use]
    pub fn search_labels(&self, needle: &str) -> Vec<&str> {
        let needle = needle.to_lowercase();
        self.records
            .iter()
            .map(|r| r.display_label.as_str())
            .filter(|label| label.to_lowercase().contains(&needle))
            .collect()
    }

    /// Distinct genres, sorted.
    #[must_use]
    pub fn genres(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.genre.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[must_use]
    pub fn get(&self, index: RecordIndex) -> Option<&CatalogRecord> {
        self.by_index.get(&index).map(|&pos| &self.records[pos])
    }

    /// Map a display label to exactly one catalog record.
    ///
    /// Resolution order:
    /// 1. `#<index>` selects by stable index.
    /// 2. An exact match on the full `"artist - name"` label.
    /// 3. A label containing `" - "` is split at the *last* separator and
    ///    must match both artist and song name; it never falls back to the
    ///    name alone.
    /// 4. A label without a separator is matched against song names.
    pub fn resolve_label(&self, label: &str) -> Result<&CatalogRecord> {
        let label = label.trim();

        if label.starts_with('#') {
            if let Ok(index) = label.parse::<RecordIndex>() {
                return self.get(index).ok_or_else(|| Error::NotFound {
                    label: label.to_string(),
                });
            }
        }

        let exact: Vec<&CatalogRecord> = self
            .records
            .iter()
            .filter(|r| r.display_label == label)
            .collect();
        if !exact.is_empty() {
            return Self::single(label, exact);
        }

        let matches: Vec<&CatalogRecord> = match label.rsplit_once(LABEL_SEPARATOR) {
            Some((artist, name)) => {
                let (artist, name) = (artist.trim(), name.trim());
                self.records
                    .iter()
                    .filter(|r| r.artist == artist && r.name == name)
                    .collect()
            }
            None => {
                log::debug!("Matching '{}' on song name", label);
                self.records.iter().filter(|r| r.name == label).collect()
            }
        };
        Self::single(label, matches)
    }

    /// Resolve a selection into the seed of a similarity search.
    pub fn resolve(&self, selection: Selection) -> Result<Seed> {
        match selection {
            Selection::Label(label) => self.resolve_label(&label).cloned().map(Seed::Catalog),
            Selection::Index(index) => self
                .get(index)
                .cloned()
                .map(Seed::Catalog)
                .ok_or_else(|| Error::NotFound {
                    label: format!("#{index}"),
                }),
            Selection::Upload(clip) => Ok(Seed::Upload(clip)),
        }
    }

    fn single<'a>(label: &str, matches: Vec<&'a CatalogRecord>) -> Result<&'a CatalogRecord> {
        match matches.as_slice() {
            [] => Err(Error::NotFound {
                label: label.to_string(),
            }),
            [record] => Ok(*record),
            _ => Err(Error::AmbiguousRecord {
                label: label.to_string(),
                count: matches.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
index,name,artist,genre,urls,artist_song
1,Buckets of Rain,Dave Van Ronk,Folk,https://audio.example/1.mp3,Dave Van Ronk - Buckets of Rain
2,So What,Miles Davis,Jazz,https://audio.example/2.mp3,Miles Davis - So What
3,Intro,Simon - Garfunkel,Folk,https://audio.example/3.mp3,Simon - Garfunkel - Intro
4,Intro,The xx,Indie,https://audio.example/4.mp3,The xx - Intro
";

    fn catalog() -> Catalog {
        Catalog::from_reader(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_load_and_labels_sorted() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 4);
        assert_eq!(
            catalog.labels(),
            vec![
                "Dave Van Ronk - Buckets of Rain",
                "Miles Davis - So What",
                "Simon - Garfunkel - Intro",
                "The xx - Intro",
            ]
        );
    }

    #[test]
    fn test_genres_are_distinct_and_sorted() {
        assert_eq!(catalog().genres(), vec!["Folk", "Indie", "Jazz"]);
    }

    #[test]
    fn test_resolve_simple_label() {
        let catalog = catalog();
        let record = catalog.resolve_label("Dave Van Ronk - Buckets of Rain").unwrap();
        assert_eq!(record.index, RecordIndex::new(1));
        assert_eq!(record.name, "Buckets of Rain");
    }

    #[test]
    fn test_resolve_artist_containing_separator() {
        let catalog = catalog();
        let record = catalog.resolve_label("Simon - Garfunkel - Intro").unwrap();
        assert_eq!(record.index, RecordIndex::new(3));
        assert_eq!(record.name, "Intro");
    }

    #[test]
    fn test_resolve_name_only_is_ambiguous() {
        let catalog = catalog();
        let err = catalog.resolve_label("Intro").unwrap_err();
        assert!(matches!(err, Error::AmbiguousRecord { count: 2, .. }));
    }

    #[test]
    fn test_resolve_unique_name_without_artist() {
        let catalog = catalog();
        let record = catalog.resolve_label("So What").unwrap();
        assert_eq!(record.index, RecordIndex::new(2));
    }

    #[test]
    fn test_resolve_wrong_artist_is_not_found() {
        let catalog = catalog();
        let err = catalog.resolve_label("Someone Else - So What").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        let err = catalog.resolve_label("Unknown Artist - Intro").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_resolve_composite_tolerates_spacing() {
        let catalog = catalog();
        let record = catalog.resolve_label("Miles Davis  -  So What").unwrap();
        assert_eq!(record.index, RecordIndex::new(2));
    }

    #[test]
    fn test_resolve_not_found() {
        let err = catalog().resolve_label("Nobody - Nothing").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(err.is_lookup_failure());
    }

    #[test]
    fn test_resolve_by_index_label() {
        let catalog = catalog();
        assert_eq!(catalog.resolve_label("#4").unwrap().artist, "The xx");
        assert!(catalog.resolve_label("#99").is_err());
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let csv = "index,name,artist,genre,urls\n1,A,B,C,u\n1,D,E,F,v\n";
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let csv = "index,name,artist,genre,urls\n";
        assert!(Catalog::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_column_is_parse_error() {
        let csv = "index,name,artist\n1,A,B\n";
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Csv(_)));
    }

    #[test]
    fn test_search_labels_case_insensitive() {
        let catalog = catalog();
        assert_eq!(catalog.search_labels("miles"), vec!["Miles Davis - So What"]);
        assert_eq!(catalog.search_labels("intro").len(), 2);
    }

    #[test]
    fn test_resolve_selection_variants() {
        let catalog = catalog();
        let seed = catalog.resolve(Selection::Index(RecordIndex::new(2))).unwrap();
        assert_eq!(seed.label(), "Miles Davis - So What");

        let missing = catalog.resolve(Selection::Index(RecordIndex::new(42)));
        assert!(missing.is_err());
    }
}
