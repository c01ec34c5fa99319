//! When the in-memory cache is mirrored to disk.

use std::time::Duration;

/// Flush cadence for [`PersistentCache`](super::PersistentCache).
///
/// Writes made after the most recent flush live only in memory. With
/// `EveryNWrites(n)` up to `n - 1` writes can be lost on a crash; with
/// `Interval` everything since the last flush; with `OnShutdown` everything
/// until `close` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    EveryNWrites(usize),
    Interval(Duration),
    OnShutdown,
}

impl Default for FlushPolicy {
    fn default() -> Self {
        FlushPolicy::EveryNWrites(10)
    }
}

impl FlushPolicy {
    /// Decide whether a write should trigger a flush.
    pub fn should_flush(&self, writes_since_flush: usize, ms_since_flush: i64) -> bool {
        match self {
            FlushPolicy::EveryNWrites(n) => writes_since_flush >= (*n).max(1),
            FlushPolicy::Interval(every) => ms_since_flush >= i64::try_from(every.as_millis()).unwrap_or(i64::MAX),
            FlushPolicy::OnShutdown => false,
        }
    }
}
