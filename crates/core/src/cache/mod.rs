//! JSON-file-backed TTL cache for extraction and aggregate results.
//!
//! This module provides a two-tier cache: an in-memory map that serves every
//! read, mirrored to a single human-readable JSON file. It supports:
//!
//! - Per-entry timestamps with TTL expiry re-checked on every read
//! - Configurable flush cadence (every N writes, interval, or shutdown only)
//! - Atomic rewrites of the backing file (temp file + rename)
//! - Read-only statistics and explicit sweeps of expired entries
//!
//! Writes made since the last flush are lost if the process dies abnormally.
//! Several processes sharing one cache file do not coordinate; the last flush
//! wins.

pub mod clock;
pub mod entry;
pub mod flush;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheData, CacheEntry, CacheKind, cache_key};
pub use flush::FlushPolicy;
pub use store::{CacheOptions, CacheStats, PersistentCache};
