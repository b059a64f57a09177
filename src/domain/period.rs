//! Period resolutions and bucket key derivation.

use super::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed-length time bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Day,
    Hour,
    Minute,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::Day, Resolution::Hour, Resolution::Minute];

    /// Length of one period in seconds.
    pub fn period_secs(&self) -> u64 {
        match self {
            Resolution::Day => 86_400,
            Resolution::Hour => 3_600,
            Resolution::Minute => 60,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Day => "day",
            Resolution::Hour => "hour",
            Resolution::Minute => "minute",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Resolution::Day),
            "hour" => Ok(Resolution::Hour),
            "minute" => Ok(Resolution::Minute),
            other => Err(format!("unknown resolution: {}", other)),
        }
    }
}

/// Identity of one bucket: a subject at one resolution for one period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    /// `subject_id-period_index`
    pub id: String,
    pub subject_id: String,
    pub resolution: Resolution,
    pub period_index: i64,
    /// First second of the period.
    pub period_start: i64,
}

impl BucketKey {
    /// Map an event timestamp to its bucket at `resolution`.
    ///
    /// Total over all timestamps: `period_index = floor(ts / len)`.
    pub fn derive(subject_id: &str, resolution: Resolution, timestamp: Timestamp) -> Self {
        let len = resolution.period_secs();
        let period_index = (timestamp.as_secs() / len) as i64;
        Self::for_period(subject_id, resolution, period_index)
    }

    /// Rebuild the key of a known period, e.g. one popped from a retention ledger.
    pub fn for_period(subject_id: &str, resolution: Resolution, period_index: i64) -> Self {
        BucketKey {
            id: bucket_id(subject_id, period_index),
            subject_id: subject_id.to_string(),
            resolution,
            period_index,
            period_start: period_index * resolution.period_secs() as i64,
        }
    }
}

/// Bucket identity string.
pub fn bucket_id(subject_id: &str, period_index: i64) -> String {
    format!("{}-{}", subject_id, period_index)
}
