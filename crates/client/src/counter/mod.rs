//! Word counting service: fetch, extract, count, fingerprint and cache.
//!
//! [`WordCountService`] owns the collaborators of the pipeline and exposes the
//! single-title and single-chapter operations. Organization aggregation lives
//! in [`aggregate`], change detection in [`changes`], and the metadata-only
//! title listing and timelines in [`catalog`].
//!
//! The cache is shared behind a `tokio::sync::Mutex` that is held for single
//! cache operations only, never across a network call.

pub mod aggregate;
pub mod catalog;
pub mod changes;

#[cfg(test)]
pub(crate) mod stub;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use regcount_core::cache::{CacheKind, CacheStats, PersistentCache};
use regcount_core::{ContentFingerprinter, Error, ExtractionResult, OrganizationDirectory, RollingHashFingerprinter, count_words};

use crate::extract::TextExtractor;
use crate::fetch::DocumentFetcher;

/// Default pause between consecutive titles of one organization.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);

/// Entry point for every counting operation.
pub struct WordCountService {
    fetcher: Arc<dyn DocumentFetcher>,
    directory: Arc<dyn OrganizationDirectory>,
    cache: Arc<Mutex<PersistentCache>>,
    fingerprinter: Arc<dyn ContentFingerprinter>,
    extractor: TextExtractor,
    request_delay: Duration,
}

impl WordCountService {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>, directory: Arc<dyn OrganizationDirectory>, cache: PersistentCache,
    ) -> Self {
        Self {
            fetcher,
            directory,
            cache: Arc::new(Mutex::new(cache)),
            fingerprinter: Arc::new(RollingHashFingerprinter),
            extractor: TextExtractor::default(),
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }

    pub fn with_fingerprinter(mut self, fingerprinter: Arc<dyn ContentFingerprinter>) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    pub fn with_extractor(mut self, extractor: TextExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    /// Count the words of a whole title, serving from cache when possible.
    pub async fn process_title(&self, title: u32) -> Result<ExtractionResult, Error> {
        self.title_result(title, false).await
    }

    /// Count the words of one chapter of a title, serving from cache when possible.
    ///
    /// # Errors
    ///
    /// `NotFound` when no chapter matcher locates `chapter` in the title.
    pub async fn process_chapter(&self, title: u32, chapter: &str) -> Result<ExtractionResult, Error> {
        let chapter = chapter.trim();
        if chapter.is_empty() {
            return Err(Error::InvalidInput("chapter must not be empty".into()));
        }

        let identifier = format!("{}-{}", title, chapter);
        if let Some(hit) = self.cached_extraction(CacheKind::Chapter, &identifier).await {
            return Ok(hit);
        }

        let (doc, issue_date) = self.fetch_title_document(title).await?;
        let text = self.extractor.extract_chapter_text(&doc, chapter);
        if text.is_empty() {
            return Err(Error::NotFound(format!("chapter {} not found in title {}", chapter, title)));
        }

        let result = self.measure(title, Some(chapter.to_string()), &text, issue_date);
        tracing::info!(title, chapter, words = result.word_count, "processed chapter");

        self.cache.lock().await.set(CacheKind::Chapter, &identifier, result.clone()).await;
        Ok(result)
    }

    /// Current cache totals. Never evicts.
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }

    /// Drop every expired cache entry and return how many were removed.
    pub async fn clear_expired_cache(&self) -> usize {
        self.cache.lock().await.clear_expired().await
    }

    /// Write pending cache changes to disk.
    pub async fn close(&self) -> Result<(), Error> {
        self.cache.lock().await.sync().await
    }

    /// Whole-title pipeline. `force` skips the cache read but still writes.
    pub(crate) async fn title_result(&self, title: u32, force: bool) -> Result<ExtractionResult, Error> {
        let identifier = title.to_string();
        if !force && let Some(hit) = self.cached_extraction(CacheKind::Title, &identifier).await {
            return Ok(hit);
        }

        let (doc, issue_date) = self.fetch_title_document(title).await?;
        let text = self.extractor.extract_full_text(&doc);
        let result = self.measure(title, None, &text, issue_date);
        tracing::info!(title, words = result.word_count, checksum = ?result.checksum, "processed title");

        self.cache.lock().await.set(CacheKind::Title, &identifier, result.clone()).await;
        Ok(result)
    }

    async fn cached_extraction(&self, kind: CacheKind, identifier: &str) -> Option<ExtractionResult> {
        let data = self.cache.lock().await.get(kind, identifier)?;
        let mut hit = data.into_extraction()?;
        hit.cached = true;
        tracing::debug!(kind = %kind, identifier, "using cached result");
        Some(hit)
    }

    async fn fetch_title_document(&self, title: u32) -> Result<(String, String), Error> {
        let meta = self.fetcher.fetch_metadata(title).await?;
        let issue_date = meta
            .latest_issue_date
            .ok_or_else(|| Error::Parse(format!("title {} has no latest issue date", title)))?;
        let doc = self.fetcher.fetch_document(title, &issue_date).await?;
        Ok((doc, issue_date))
    }

    fn measure(&self, title: u32, chapter: Option<String>, text: &str, issue_date: String) -> ExtractionResult {
        let words = count_words(text);
        let checksum = self.fingerprinter.fingerprint(text);
        ExtractionResult::success(title, chapter, text, words, checksum, Some(issue_date))
    }
}

#[cfg(test)]
mod tests {
    use super::stub::{StubFetcher, service_with};
    use super::*;
    use regcount_core::fingerprint::fingerprint;
    use regcount_core::{Sha256Fingerprinter, TitleMetadata};

    #[tokio::test]
    async fn test_process_title_counts_words() {
        let fetcher = StubFetcher::new().with_title(1, "<P>The quick fox runs.</P>");
        let (service, _tmp) = service_with(fetcher.clone(), vec![]).await;

        let result = service.process_title(1).await.unwrap();
        assert_eq!(result.word_count, 4);
        assert_eq!(result.checksum.as_deref(), Some(fingerprint("The quick fox runs.").as_str()));
        assert_eq!(result.issue_date.as_deref(), Some("2024-01-01"));
        assert!(!result.cached);
    }

    #[tokio::test]
    async fn test_process_title_second_call_is_cached() {
        let fetcher = StubFetcher::new().with_title(1, "<P>The quick fox runs.</P>");
        let (service, _tmp) = service_with(fetcher.clone(), vec![]).await;

        let first = service.process_title(1).await.unwrap();
        let second = service.process_title(1).await.unwrap();
        assert!(second.cached);
        assert_eq!(first.checksum, second.checksum);
        assert_eq!(fetcher.document_fetches(), 1);
    }

    #[tokio::test]
    async fn test_process_title_errors_propagate() {
        let fetcher = StubFetcher::new().with_reserved(35);
        let (service, _tmp) = service_with(fetcher, vec![]).await;

        assert!(matches!(service.process_title(35).await, Err(Error::ReservedTitle(35))));
        assert!(matches!(service.process_title(99).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_issue_date_is_parse_error() {
        let fetcher = StubFetcher::new().with_metadata(TitleMetadata {
            number: 4,
            name: "Accounts".into(),
            latest_issue_date: None,
            latest_amended_on: None,
            up_to_date_as_of: None,
            reserved: false,
        });
        let (service, _tmp) = service_with(fetcher, vec![]).await;

        assert!(matches!(service.process_title(4).await, Err(Error::Parse(_))));
    }

    #[tokio::test]
    async fn test_process_chapter() {
        let doc = "<HEAD>CHAPTER I—FIRST</HEAD><P>Chapter one has words.</P>\
                   <HEAD>CHAPTER II—SECOND</HEAD><P>Chapter two has more words here.</P>";
        let fetcher = StubFetcher::new().with_title(7, doc);
        let (service, _tmp) = service_with(fetcher.clone(), vec![]).await;

        let result = service.process_chapter(7, "II").await.unwrap();
        assert_eq!(result.chapter.as_deref(), Some("II"));
        assert_eq!(result.word_count, 6);

        let cached = service.process_chapter(7, "II").await.unwrap();
        assert!(cached.cached);
        assert_eq!(fetcher.document_fetches(), 1);
    }

    #[tokio::test]
    async fn test_process_chapter_not_found() {
        let fetcher = StubFetcher::new().with_title(7, "<P>No chapters in here at all.</P>");
        let (service, _tmp) = service_with(fetcher, vec![]).await;

        let err = service.process_chapter(7, "XII").await.unwrap_err();
        assert!(matches!(&err, Error::NotFound(msg) if msg == "chapter XII not found in title 7"));
        assert!(matches!(service.process_chapter(7, " ").await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_swapped_fingerprinter() {
        let fetcher = StubFetcher::new().with_title(1, "<P>The quick fox runs.</P>");
        let (service, _tmp) = service_with(fetcher, vec![]).await;
        let service = service.with_fingerprinter(Arc::new(Sha256Fingerprinter));

        let result = service.process_title(1).await.unwrap();
        assert_eq!(result.checksum.as_deref(), Some(Sha256Fingerprinter.fingerprint("The quick fox runs.").as_str()));
    }

    #[tokio::test]
    async fn test_cache_stats_and_close() {
        let fetcher = StubFetcher::new().with_title(1, "<P>The quick fox runs.</P>");
        let (service, tmp) = service_with(fetcher, vec![]).await;

        service.process_title(1).await.unwrap();
        let stats = service.cache_stats().await;
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.counts_by_type.get("title"), Some(&1));
        assert_eq!(service.clear_expired_cache().await, 0);

        service.close().await.unwrap();
        assert!(tmp.path().join("cache.json").exists());
    }
}
