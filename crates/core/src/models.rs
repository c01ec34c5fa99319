//! Domain records produced and consumed by the counting pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Characters of extracted text kept as a preview.
const SAMPLE_LEN: usize = 200;

/// Metadata for a single regulation title as reported upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleMetadata {
    pub number: u32,
    pub name: String,
    #[serde(default)]
    pub latest_issue_date: Option<String>,
    #[serde(default)]
    pub latest_amended_on: Option<String>,
    #[serde(default)]
    pub up_to_date_as_of: Option<String>,
    #[serde(default)]
    pub reserved: bool,
}

/// Outcome of extracting and counting one title or chapter.
///
/// A failed extraction keeps `error` set and `word_count` at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    pub word_count: usize,
    #[serde(default)]
    pub text_length: usize,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub sample_text: Option<String>,
    pub processed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set on values served from the cache.
    #[serde(default)]
    pub cached: bool,
}

impl ExtractionResult {
    /// Build a successful result from extracted text and its derived values.
    pub fn success(
        title: u32, chapter: Option<String>, text: &str, word_count: usize, checksum: String, issue_date: Option<String>,
    ) -> Self {
        Self {
            title,
            chapter,
            word_count,
            text_length: text.chars().count(),
            checksum: Some(checksum),
            issue_date,
            sample_text: Some(sample_of(text)),
            processed_at: Utc::now(),
            error: None,
            cached: false,
        }
    }

    /// Build a captured failure.
    pub fn failure(title: u32, chapter: Option<String>, error: impl ToString) -> Self {
        Self {
            title,
            chapter,
            word_count: 0,
            text_length: 0,
            checksum: None,
            issue_date: None,
            sample_text: None,
            processed_at: Utc::now(),
            error: Some(error.to_string()),
            cached: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

fn sample_of(text: &str) -> String {
    let mut sample: String = text.chars().take(SAMPLE_LEN).collect();
    sample.push_str("...");
    sample
}

/// A (title, chapter?) pair an organization is responsible for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    pub title: u32,
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
}

/// Canonical organization record resolved from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub sortable_name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, alias = "cfr_references")]
    pub references: Vec<DocumentReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Organization>,
}

impl Organization {
    pub fn new(name: impl Into<String>, references: Vec<DocumentReference>) -> Self {
        Self {
            name: name.into(),
            short_name: None,
            display_name: None,
            sortable_name: None,
            slug: None,
            references,
            children: Vec::new(),
        }
    }
}

/// Roll-up of every title referenced by one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub organization: Organization,
    pub per_title_results: Vec<ExtractionResult>,
    pub total_words: usize,
    pub total_titles: usize,
    pub aggregate_checksum: String,
    pub processed_at: DateTime<Utc>,
}

impl AggregateResult {
    /// Number of titles that were extracted without error.
    pub fn processed_titles(&self) -> usize {
        self.per_title_results.iter().filter(|r| r.is_success()).count()
    }
}

/// Result of comparing a fresh computation against the cached one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeReport {
    pub changed: bool,
    pub old_checksum: Option<String>,
    pub new_checksum: Option<String>,
    pub old_word_count: Option<usize>,
    pub new_word_count: Option<usize>,
    pub reason: String,
}

impl ChangeReport {
    pub const NO_PREVIOUS_CACHE: &'static str = "no previous cache found";
    pub const NOT_FOUND: &'static str = "not found";
    pub const CHANGED: &'static str = "content has changed";
    pub const UNCHANGED: &'static str = "no changes detected";

    /// A report that carries only a reason, used when no comparison was possible.
    pub fn unresolved(reason: &str) -> Self {
        Self {
            changed: true,
            old_checksum: None,
            new_checksum: None,
            old_word_count: None,
            new_word_count: None,
            reason: reason.to_string(),
        }
    }

    /// Compare two checksums and their word counts.
    pub fn compare(old_checksum: String, old_words: usize, new_checksum: String, new_words: usize) -> Self {
        let changed = old_checksum != new_checksum;
        Self {
            changed,
            old_checksum: Some(old_checksum),
            new_checksum: Some(new_checksum),
            old_word_count: Some(old_words),
            new_word_count: Some(new_words),
            reason: if changed { Self::CHANGED } else { Self::UNCHANGED }.to_string(),
        }
    }
}
