//! Cache entry layout and composite keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{AggregateResult, ExtractionResult};

/// Namespace of a cache entry; forms the first half of the composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    Title,
    Chapter,
    Organization,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Title => "title",
            CacheKind::Chapter => "chapter",
            CacheKind::Organization => "organization",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload stored in an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheData {
    Aggregate(AggregateResult),
    Extraction(ExtractionResult),
}

impl CacheData {
    /// Content fingerprint of the payload, if it has one.
    pub fn checksum(&self) -> Option<&str> {
        match self {
            CacheData::Aggregate(a) => Some(a.aggregate_checksum.as_str()),
            CacheData::Extraction(e) => e.checksum.as_deref(),
        }
    }

    pub fn word_count(&self) -> usize {
        match self {
            CacheData::Aggregate(a) => a.total_words,
            CacheData::Extraction(e) => e.word_count,
        }
    }

    pub fn into_extraction(self) -> Option<ExtractionResult> {
        match self {
            CacheData::Extraction(e) => Some(e),
            CacheData::Aggregate(_) => None,
        }
    }

    pub fn into_aggregate(self) -> Option<AggregateResult> {
        match self {
            CacheData::Aggregate(a) => Some(a),
            CacheData::Extraction(_) => None,
        }
    }
}

impl From<ExtractionResult> for CacheData {
    fn from(value: ExtractionResult) -> Self {
        CacheData::Extraction(value)
    }
}

impl From<AggregateResult> for CacheData {
    fn from(value: AggregateResult) -> Self {
        CacheData::Aggregate(value)
    }
}

/// A stored payload with its write time (epoch milliseconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: CacheData,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: CacheKind,
    pub identifier: String,
}

impl CacheEntry {
    /// Milliseconds since the entry was written. Saturates on out-of-range timestamps.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.timestamp)
    }

    /// An entry is expired once its age reaches the TTL.
    pub fn is_expired(&self, now_ms: i64, ttl_ms: i64) -> bool {
        self.age_ms(now_ms) >= ttl_ms
    }
}

/// Composite key `type:identifier`.
pub fn cache_key(kind: CacheKind, identifier: &str) -> String {
    format!("{}:{}", kind.as_str(), identifier)
}
