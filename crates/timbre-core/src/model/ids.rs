use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a song, shared by the catalog and the vector backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordIndex(u64);

impl RecordIndex {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for RecordIndex {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordIndex {
    type Err = std::num::ParseIntError;

    /// Accepts both `42` and `#42`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        digits.parse::<u64>().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_index_display() {
        assert_eq!(RecordIndex::new(17).to_string(), "17");
    }

    #[test]
    fn test_record_index_parse_with_hash() {
        assert_eq!("#42".parse::<RecordIndex>().unwrap(), RecordIndex::new(42));
        assert_eq!(" 7 ".parse::<RecordIndex>().unwrap(), RecordIndex::new(7));
        assert!("abc".parse::<RecordIndex>().is_err());
    }

    #[test]
    fn test_record_index_serializes_as_number() {
        let json = serde_json::to_string(&RecordIndex::new(3)).unwrap();
        assert_eq!(json, "3");
    }
}
