//! Last-known-good snapshot store.
//!
//! Reads never block on network activity: renderers always get the last
//! successful snapshot (possibly none before the first success) plus
//! error/staleness metadata. A failed refresh never clears existing data,
//! so a stale frame beats a blank display.

use chrono::{DateTime, Local};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use pixelwx_core::FetchError;

use crate::types::WeatherSnapshot;

/// Point-in-time view of the cache.
///
/// The snapshot payload is shared behind an `Arc`, so taking a view is
/// cheap and a concurrent commit can never tear it.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    pub snapshot: Option<Arc<WeatherSnapshot>>,
    /// When the snapshot was committed
    pub last_fetch: Option<DateTime<Local>>,
    pub last_error: Option<FetchError>,
    pub consecutive_failures: u32,
}

impl CacheEntry {
    pub fn has_data(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Elapsed time since the last successful fetch. Computed on read,
    /// never stored.
    pub fn staleness(&self, now: DateTime<Local>) -> Option<Duration> {
        self.last_fetch
            .map(|fetched| now.signed_duration_since(fetched).to_std().unwrap_or_default())
    }
}

/// Owner of the single `CacheEntry`, mutated only by the scheduler's
/// completion handling.
#[derive(Debug, Default)]
pub struct WeatherCache {
    entry: RwLock<CacheEntry>,
}

impl WeatherCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current entry. Never blocks on network activity.
    pub fn read(&self) -> CacheEntry {
        self.entry.read().clone()
    }

    /// Replace the snapshot atomically and clear the failure streak.
    pub fn commit_success(&self, snapshot: WeatherSnapshot, now: DateTime<Local>) {
        let mut entry = self.entry.write();
        entry.snapshot = Some(Arc::new(snapshot));
        entry.last_fetch = Some(now);
        entry.last_error = None;
        entry.consecutive_failures = 0;
        tracing::debug!("weather snapshot committed");
    }

    /// Record a failed refresh. The existing snapshot, if any, stays
    /// untouched and displayable.
    pub fn commit_failure(&self, error: FetchError, now: DateTime<Local>) {
        let mut entry = self.entry.write();
        entry.consecutive_failures += 1;
        tracing::debug!(
            error = %error,
            failures = entry.consecutive_failures,
            at = %now,
            "weather refresh failed; keeping cached snapshot"
        );
        entry.last_error = Some(error);
    }
}
