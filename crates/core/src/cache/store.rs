//! In-memory cache map mirrored to a JSON file.
//!
//! The file is a flat object from `type:identifier` to
//! `{data, timestamp, type, identifier}`. It is loaded wholesale by
//! [`PersistentCache::open`] and rewritten wholesale on every flush.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use super::clock::{Clock, SystemClock};
use super::entry::{CacheData, CacheEntry, CacheKind, cache_key};
use super::flush::FlushPolicy;
use crate::Error;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Tunables for a [`PersistentCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    pub ttl: Duration,
    pub flush_policy: FlushPolicy,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL, flush_policy: FlushPolicy::default() }
    }
}

/// Aggregate view over the current entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub counts_by_type: BTreeMap<String, usize>,
}

/// Persistent TTL cache.
///
/// Entries move `absent -> valid -> expired -> absent`; an expired entry is
/// evicted by the read that notices it, and only `set` makes it valid again.
#[derive(Debug)]
pub struct PersistentCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
    options: CacheOptions,
    clock: Arc<dyn Clock>,
    writes_since_flush: usize,
    last_flush_ms: i64,
    dirty: bool,
}

impl PersistentCache {
    /// Open the cache stored at `path` using the wall clock.
    ///
    /// A missing file yields an empty cache. An unreadable or corrupt file is
    /// logged and also yields an empty cache.
    pub async fn open(path: impl AsRef<Path>, options: CacheOptions) -> Self {
        Self::open_with_clock(path, options, Arc::new(SystemClock)).await
    }

    /// Open the cache with an explicit time source.
    pub async fn open_with_clock(path: impl AsRef<Path>, options: CacheOptions, clock: Arc<dyn Clock>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = load_entries(&path).await;
        let now = clock.now_ms();

        Self { path, entries, options, clock, writes_since_flush: 0, last_flush_ms: now, dirty: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ttl_ms(&self) -> i64 {
        i64::try_from(self.options.ttl.as_millis()).unwrap_or(i64::MAX)
    }

    /// Look up a payload, evicting it if its age has reached the TTL.
    pub fn get(&mut self, kind: CacheKind, identifier: &str) -> Option<CacheData> {
        let key = cache_key(kind, identifier);
        let now = self.clock.now_ms();
        let ttl = self.ttl_ms();

        let entry = self.entries.get(&key)?;
        let age_min = entry.age_ms(now) / 60_000;

        if entry.is_expired(now, ttl) {
            tracing::debug!(key = %key, age_min, "cache entry expired");
            self.entries.remove(&key);
            self.dirty = true;
            return None;
        }

        tracing::debug!(key = %key, age_min, "cache hit");
        Some(entry.data.clone())
    }

    /// Insert or overwrite a payload, stamping it with the current time.
    ///
    /// Flushes to disk when the flush policy says so. Flush failures are
    /// logged and retried at the next scheduled opportunity.
    pub async fn set(&mut self, kind: CacheKind, identifier: &str, data: impl Into<CacheData>) {
        let key = cache_key(kind, identifier);
        let now = self.clock.now_ms();

        self.entries.insert(
            key.clone(),
            CacheEntry { data: data.into(), timestamp: now, kind, identifier: identifier.to_string() },
        );
        self.dirty = true;
        self.writes_since_flush += 1;
        tracing::debug!(key = %key, "cached");

        if self
            .options
            .flush_policy
            .should_flush(self.writes_since_flush, now.saturating_sub(self.last_flush_ms))
        {
            self.scheduled_flush().await;
        }
    }

    /// Remove every entry whose age has reached the TTL.
    ///
    /// Returns the number of removed entries and flushes if any were removed.
    pub async fn clear_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let ttl = self.ttl_ms();
        let before = self.entries.len();

        self.entries.retain(|_, entry| !entry.is_expired(now, ttl));
        let cleared = before - self.entries.len();

        if cleared > 0 {
            tracing::info!(cleared, "cleared expired cache entries");
            self.dirty = true;
            self.scheduled_flush().await;
        }

        cleared
    }

    /// Count entries by validity and type. Never evicts.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        let ttl = self.ttl_ms();
        let mut stats = CacheStats { total_entries: self.entries.len(), ..Default::default() };

        for entry in self.entries.values() {
            if entry.is_expired(now, ttl) {
                stats.expired_entries += 1;
            } else {
                stats.valid_entries += 1;
            }
            *stats.counts_by_type.entry(entry.kind.to_string()).or_default() += 1;
        }

        stats
    }

    /// Write the whole map to disk now.
    pub async fn flush(&mut self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(&self.entries)?;
        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await?;

        self.dirty = false;
        self.writes_since_flush = 0;
        self.last_flush_ms = self.clock.now_ms();
        tracing::debug!(entries = self.entries.len(), path = %self.path.display(), "saved cache to disk");
        Ok(())
    }

    /// Whether there are changes not yet written to disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flush only if there are unwritten changes.
    pub async fn sync(&mut self) -> Result<(), Error> {
        if self.dirty {
            self.flush().await?;
        }
        Ok(())
    }

    /// Flush pending writes and release the cache.
    pub async fn close(mut self) -> Result<(), Error> {
        self.sync().await
    }

    async fn scheduled_flush(&mut self) {
        if let Err(e) = self.flush().await {
            tracing::warn!(error = %e, path = %self.path.display(), "cache flush failed, will retry on next flush");
            self.writes_since_flush = 0;
            self.last_flush_ms = self.clock.now_ms();
        }
    }
}

async fn load_entries(path: &Path) -> BTreeMap<String, CacheEntry> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "failed to read cache file, starting empty");
            return BTreeMap::new();
        }
    };

    match serde_json::from_slice::<BTreeMap<String, CacheEntry>>(&bytes) {
        Ok(entries) => {
            tracing::info!(entries = entries.len(), "loaded cached entries");
            entries
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "failed to parse cache file, starting empty");
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::models::ExtractionResult;
    use tempfile::TempDir;

    const T0: i64 = 1_700_000_000_000;

    fn title_result(title: u32, checksum: &str) -> ExtractionResult {
        ExtractionResult::success(title, None, "some regulation text", 3, checksum.to_string(), None)
    }

    async fn open_manual(dir: &TempDir, options: CacheOptions) -> (PersistentCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(T0));
        let cache = PersistentCache::open_with_clock(dir.path().join("cache.json"), options, clock.clone()).await;
        (cache, clock)
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_cache() {
        let tmp = TempDir::new().unwrap();
        let cache = PersistentCache::open(tmp.path().join("nope.json"), CacheOptions::default()).await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty_cache() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let cache = PersistentCache::open(&path, CacheOptions::default()).await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let tmp = TempDir::new().unwrap();
        let (mut cache, _clock) = open_manual(&tmp, CacheOptions::default()).await;

        cache.set(CacheKind::Title, "1", title_result(1, "abc")).await;
        let data = cache.get(CacheKind::Title, "1").unwrap();
        assert_eq!(data.checksum(), Some("abc"));
        assert!(cache.get(CacheKind::Chapter, "1").is_none());
    }

    #[tokio::test]
    async fn test_ttl_boundary() {
        let tmp = TempDir::new().unwrap();
        let (mut cache, clock) = open_manual(&tmp, CacheOptions::default()).await;
        let ttl = DEFAULT_TTL.as_millis() as i64;

        cache.set(CacheKind::Title, "1", title_result(1, "abc")).await;

        clock.set(T0 + ttl - 1);
        assert!(cache.get(CacheKind::Title, "1").is_some());

        clock.set(T0 + ttl);
        assert!(cache.get(CacheKind::Title, "1").is_none());
        assert_eq!(cache.len(), 0, "expired entry is evicted on read");
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_timestamp() {
        let tmp = TempDir::new().unwrap();
        let (mut cache, clock) = open_manual(&tmp, CacheOptions::default()).await;
        let ttl = DEFAULT_TTL.as_millis() as i64;

        cache.set(CacheKind::Title, "1", title_result(1, "old")).await;
        clock.advance(ttl - 10);
        cache.set(CacheKind::Title, "1", title_result(1, "new")).await;
        clock.advance(20);

        let data = cache.get(CacheKind::Title, "1").unwrap();
        assert_eq!(data.checksum(), Some("new"));
    }

    #[tokio::test]
    async fn test_stats_do_not_evict() {
        let tmp = TempDir::new().unwrap();
        let (mut cache, clock) = open_manual(&tmp, CacheOptions::default()).await;
        let ttl = DEFAULT_TTL.as_millis() as i64;

        cache.set(CacheKind::Title, "1", title_result(1, "a")).await;
        clock.advance(ttl);
        cache.set(CacheKind::Chapter, "1-I", title_result(1, "b")).await;

        let before = cache.stats();
        assert_eq!(before.total_entries, 2);
        assert_eq!(before.valid_entries, 1);
        assert_eq!(before.expired_entries, 1);
        assert_eq!(before.counts_by_type.get("title"), Some(&1));
        assert_eq!(before.counts_by_type.get("chapter"), Some(&1));

        // A read of a valid entry evicts nothing.
        assert!(cache.get(CacheKind::Chapter, "1-I").is_some());
        assert_eq!(cache.stats().total_entries, before.total_entries);
    }

    #[tokio::test]
    async fn test_clear_expired_removes_only_expired() {
        let tmp = TempDir::new().unwrap();
        let (mut cache, clock) = open_manual(&tmp, CacheOptions::default()).await;
        let ttl = DEFAULT_TTL.as_millis() as i64;

        cache.set(CacheKind::Title, "1", title_result(1, "a")).await;
        cache.set(CacheKind::Title, "2", title_result(2, "b")).await;
        clock.advance(ttl);
        cache.set(CacheKind::Title, "3", title_result(3, "c")).await;

        assert_eq!(cache.clear_expired().await, 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(CacheKind::Title, "3").is_some());
        assert_eq!(cache.clear_expired().await, 0);

        // The sweep flushed, so a fresh open sees only the survivor.
        let reopened = PersistentCache::open(cache.path(), CacheOptions::default()).await;
        assert_eq!(reopened.len(), 1);
    }

    #[tokio::test]
    async fn test_flush_every_n_writes() {
        let tmp = TempDir::new().unwrap();
        let options = CacheOptions { flush_policy: FlushPolicy::EveryNWrites(3), ..Default::default() };
        let (mut cache, _clock) = open_manual(&tmp, options).await;
        let path = cache.path().to_path_buf();

        cache.set(CacheKind::Title, "1", title_result(1, "a")).await;
        cache.set(CacheKind::Title, "2", title_result(2, "b")).await;
        assert!(!path.exists(), "no flush before the third write");

        cache.set(CacheKind::Title, "3", title_result(3, "c")).await;
        assert!(path.exists());

        let reopened = PersistentCache::open(&path, CacheOptions::default()).await;
        assert_eq!(reopened.len(), 3);
    }

    #[tokio::test]
    async fn test_default_policy_flushes_on_tenth_write() {
        let tmp = TempDir::new().unwrap();
        let (mut cache, _clock) = open_manual(&tmp, CacheOptions::default()).await;
        let path = cache.path().to_path_buf();

        for i in 0..9 {
            cache.set(CacheKind::Title, &i.to_string(), title_result(i, "x")).await;
        }
        assert!(!path.exists());

        cache.set(CacheKind::Title, "9", title_result(9, "x")).await;
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_interval_policy() {
        let tmp = TempDir::new().unwrap();
        let options = CacheOptions { flush_policy: FlushPolicy::Interval(Duration::from_secs(60)), ..Default::default() };
        let (mut cache, clock) = open_manual(&tmp, options).await;
        let path = cache.path().to_path_buf();

        cache.set(CacheKind::Title, "1", title_result(1, "a")).await;
        assert!(!path.exists());

        clock.advance(60_000);
        cache.set(CacheKind::Title, "2", title_result(2, "b")).await;
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_close_flushes_pending_writes() {
        let tmp = TempDir::new().unwrap();
        let options = CacheOptions { flush_policy: FlushPolicy::OnShutdown, ..Default::default() };
        let (mut cache, _clock) = open_manual(&tmp, options).await;
        let path = cache.path().to_path_buf();

        cache.set(CacheKind::Organization, "FCC", title_result(47, "a")).await;
        assert!(!path.exists());

        cache.close().await.unwrap();
        let reopened = PersistentCache::open(&path, CacheOptions::default()).await;
        assert_eq!(reopened.len(), 1);
    }

    #[tokio::test]
    async fn test_file_layout_is_flat_key_map() {
        let tmp = TempDir::new().unwrap();
        let (mut cache, _clock) = open_manual(&tmp, CacheOptions::default()).await;

        cache.set(CacheKind::Title, "5", title_result(5, "abc")).await;
        cache.flush().await.unwrap();

        let raw = tokio::fs::read_to_string(cache.path()).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entry = &value["title:5"];
        assert_eq!(entry["type"], "title");
        assert_eq!(entry["identifier"], "5");
        assert_eq!(entry["timestamp"], T0);
        assert_eq!(entry["data"]["checksum"], "abc");
    }

    #[tokio::test]
    async fn test_extreme_timestamps_and_ttl() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        let entries: BTreeMap<String, CacheEntry> = [("1", i64::MIN), ("2", i64::MAX)]
            .into_iter()
            .map(|(id, timestamp)| {
                let entry = CacheEntry {
                    data: title_result(1, "abc").into(),
                    timestamp,
                    kind: CacheKind::Title,
                    identifier: id.into(),
                };
                (cache_key(CacheKind::Title, id), entry)
            })
            .collect();
        tokio::fs::write(&path, serde_json::to_vec(&entries).unwrap()).await.unwrap();

        let options = CacheOptions { ttl: Duration::MAX, ..Default::default() };
        let mut cache = PersistentCache::open_with_clock(&path, options, Arc::new(ManualClock::new(T0))).await;

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 1);
        assert!(cache.get(CacheKind::Title, "1").is_none());
        assert!(cache.get(CacheKind::Title, "2").is_some());
    }

    #[tokio::test]
    async fn test_failed_flush_is_not_fatal() {
        let tmp = TempDir::new().unwrap();
        // The parent "directory" is a regular file, so every flush fails.
        let blocker = tmp.path().join("blocker");
        tokio::fs::write(&blocker, b"").await.unwrap();
        let options = CacheOptions { flush_policy: FlushPolicy::EveryNWrites(1), ..Default::default() };
        let mut cache = PersistentCache::open(blocker.join("cache.json"), options).await;

        cache.set(CacheKind::Title, "1", title_result(1, "a")).await;
        assert!(cache.get(CacheKind::Title, "1").is_some());
        assert!(cache.flush().await.is_err());
    }
}
