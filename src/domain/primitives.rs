//! Domain primitives: Timestamp, SubjectId, PairId.

use serde::{Deserialize, Serialize};

/// Event time in whole seconds since the Unix epoch.
///
/// Unsigned so that every period index derived from it is non-negative.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Create a Timestamp from seconds.
    pub fn new(secs: u64) -> Self {
        Timestamp(secs)
    }

    /// Get the underlying seconds value.
    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

/// Identity of a tracked instrument (a token).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub String);

impl SubjectId {
    /// Create a SubjectId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        SubjectId(id.into())
    }

    /// Get the id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a tradable pair of two subjects.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairId(pub String);

impl PairId {
    /// Create a PairId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        PairId(id.into())
    }

    /// Get the id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PairId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_id_display() {
        let id = SubjectId::new("0xabc");
        assert_eq!(id.to_string(), "0xabc");
        assert_eq!(id.as_str(), "0xabc");
    }

    #[test]
    fn test_pair_id_serializes_as_plain_string() {
        let id = PairId::new("0xpair");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0xpair\"");
    }

    #[test]
    fn test_timestamp_ordering() {
        assert!(Timestamp::new(59) < Timestamp::new(60));
    }
}
