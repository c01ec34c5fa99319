//! In-memory fetcher and service wiring for counter tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use regcount_core::cache::{CacheOptions, PersistentCache};
use regcount_core::{Error, JsonDirectory, Organization, TitleMetadata};

use super::WordCountService;
use crate::fetch::DocumentFetcher;

pub(crate) const ISSUE_DATE: &str = "2024-01-01";

#[derive(Default)]
struct Inner {
    metadata: Mutex<HashMap<u32, TitleMetadata>>,
    documents: Mutex<HashMap<u32, String>>,
    failing: Mutex<HashSet<u32>>,
    document_fetches: AtomicUsize,
}

/// Fetcher serving canned documents; clones share state.
#[derive(Clone, Default)]
pub(crate) struct StubFetcher {
    inner: Arc<Inner>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_title(self, title: u32, doc: &str) -> Self {
        self.set_document(title, doc);
        self.with_metadata(TitleMetadata {
            number: title,
            name: format!("Title {}", title),
            latest_issue_date: Some(ISSUE_DATE.into()),
            latest_amended_on: Some(ISSUE_DATE.into()),
            up_to_date_as_of: Some(ISSUE_DATE.into()),
            reserved: false,
        })
    }

    pub(crate) fn with_reserved(self, title: u32) -> Self {
        self.with_metadata(TitleMetadata {
            number: title,
            name: format!("Title {} [Reserved]", title),
            latest_issue_date: None,
            latest_amended_on: None,
            up_to_date_as_of: None,
            reserved: true,
        })
    }

    pub(crate) fn with_metadata(self, meta: TitleMetadata) -> Self {
        self.inner.metadata.lock().unwrap().insert(meta.number, meta);
        self
    }

    /// Metadata resolves but the document request fails with a network error.
    pub(crate) fn with_failing_document(self, title: u32) -> Self {
        self.inner.failing.lock().unwrap().insert(title);
        self.with_title(title, "")
    }

    pub(crate) fn set_document(&self, title: u32, doc: &str) {
        self.inner.documents.lock().unwrap().insert(title, doc.to_string());
    }

    pub(crate) fn document_fetches(&self) -> usize {
        self.inner.document_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for StubFetcher {
    async fn fetch_metadata(&self, title: u32) -> Result<TitleMetadata, Error> {
        let meta = self
            .inner
            .metadata
            .lock()
            .unwrap()
            .get(&title)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("title {} not found", title)))?;
        if meta.reserved {
            return Err(Error::ReservedTitle(title));
        }
        Ok(meta)
    }

    async fn fetch_document(&self, title: u32, _issue_date: &str) -> Result<String, Error> {
        self.inner.document_fetches.fetch_add(1, Ordering::SeqCst);
        if self.inner.failing.lock().unwrap().contains(&title) {
            return Err(Error::Network("status 500".into()));
        }
        self.inner
            .documents
            .lock()
            .unwrap()
            .get(&title)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("title {} not found", title)))
    }

    async fn fetch_titles(&self) -> Result<Vec<TitleMetadata>, Error> {
        let mut titles: Vec<TitleMetadata> = self.inner.metadata.lock().unwrap().values().cloned().collect();
        titles.sort_by_key(|t| t.number);
        Ok(titles)
    }
}

/// Service over `fetcher` and `organizations` with a fresh cache and no request delay.
pub(crate) async fn service_with(fetcher: StubFetcher, organizations: Vec<Organization>) -> (WordCountService, TempDir) {
    let tmp = TempDir::new().unwrap();
    let cache = PersistentCache::open(tmp.path().join("cache.json"), CacheOptions::default()).await;
    let directory = JsonDirectory::from_organizations(organizations);
    let service =
        WordCountService::new(Arc::new(fetcher), Arc::new(directory), cache).with_request_delay(Duration::ZERO);
    (service, tmp)
}
