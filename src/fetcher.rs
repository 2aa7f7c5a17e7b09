//! Snapshot fetcher
//!
//! For one city, looks up the response cache and calls the live endpoint at
//! the same time, and emits at most one snapshot per source. A cached
//! snapshot is only emitted while the live request for that key is still
//! outstanding; once a live snapshot has been emitted, a late cache hit is
//! dropped so it can never replace fresher data.
//!
//! Both lookups run as spawned tasks and report on an unbounded channel. The
//! per-key pending flag is checked and updated under the same lock as the
//! channel send, so the order events enter the channel always matches the
//! order the flag changed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::debug;

use crate::cache::ResponseCache;
use crate::data::{forecast_url, parse_forecast, ForecastSource, Snapshot, Source};

/// A snapshot on its way to the dispatcher, tagged with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEvent {
    pub source: Source,
    pub snapshot: Snapshot,
}

/// Per-key "live request outstanding" flags
///
/// Each key has its own flag; fetches for different keys never see each
/// other's state.
#[derive(Debug, Clone, Default)]
pub struct PendingRequests {
    inner: Arc<Mutex<HashMap<String, bool>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a live request for `key` is outstanding
    pub fn is_pending(&self, key: &str) -> bool {
        self.lock().get(key).copied().unwrap_or(false)
    }

    /// Marks a live request for `key` as started
    fn begin(&self, key: &str) {
        self.lock().insert(key.to_string(), true);
    }

    /// Runs `emit` only if the live request for `key` is still outstanding.
    /// Returns whether it ran.
    fn emit_if_pending(&self, key: &str, emit: impl FnOnce()) -> bool {
        let flags = self.lock();
        if flags.get(key).copied().unwrap_or(false) {
            emit();
            true
        } else {
            false
        }
    }

    /// Clears the flag for `key` and runs `emit` while still holding the lock
    fn complete_and_emit(&self, key: &str, emit: impl FnOnce()) {
        let mut flags = self.lock();
        flags.insert(key.to_string(), false);
        emit();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, bool>> {
        // The map only holds booleans, so a panic elsewhere cannot leave it torn
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Fetches snapshots from the response cache and the live endpoint
#[derive(Clone)]
pub struct SnapshotFetcher {
    base_url: String,
    live: Arc<dyn ForecastSource>,
    cache: Option<Arc<dyn ResponseCache>>,
    pending: PendingRequests,
}

impl SnapshotFetcher {
    /// Creates a fetcher. With `cache` set to `None` only the live endpoint is used.
    pub fn new(
        base_url: impl Into<String>,
        live: Arc<dyn ForecastSource>,
        cache: Option<Arc<dyn ResponseCache>>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            live,
            cache,
            pending: PendingRequests::new(),
        }
    }

    /// Handle to the per-key pending flags
    pub fn pending(&self) -> &PendingRequests {
        &self.pending
    }

    /// Fetches `key` and returns the stream of its snapshots
    ///
    /// The receiver yields zero, one or two events and closes once both
    /// lookups have finished.
    pub fn fetch(&self, key: &str, label: &str) -> mpsc::UnboundedReceiver<SnapshotEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.fetch_into(key, label, tx);
        rx
    }

    /// Fetches `key`, sending its snapshots into `tx`
    ///
    /// Must be called from within a tokio runtime. The pending flag is set
    /// before this returns, so a cache hit can never observe a stale "not
    /// pending" state left by an earlier fetch of the same key.
    pub fn fetch_into(&self, key: &str, label: &str, tx: mpsc::UnboundedSender<SnapshotEvent>) {
        let url = forecast_url(&self.base_url, key);
        self.pending.begin(key);
        debug!(%key, %url, "Fetching forecast");

        if let Some(cache) = &self.cache {
            tokio::spawn(lookup_cached(
                Arc::clone(cache),
                self.pending.clone(),
                url.clone(),
                key.to_string(),
                label.to_string(),
                tx.clone(),
            ));
        }

        tokio::spawn(request_live(
            Arc::clone(&self.live),
            self.pending.clone(),
            url,
            key.to_string(),
            label.to_string(),
            tx,
        ));
    }
}

async fn lookup_cached(
    cache: Arc<dyn ResponseCache>,
    pending: PendingRequests,
    url: String,
    key: String,
    label: String,
    tx: mpsc::UnboundedSender<SnapshotEvent>,
) {
    let Some(cached) = cache.lookup(&url).await else {
        debug!(%key, "No cached response");
        return;
    };

    let snapshot = match parse_forecast(&cached.body, &key, &label) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            debug!(%key, error = %e, "Ignoring unparsable cached response");
            return;
        }
    };

    let event = SnapshotEvent {
        source: Source::Cached,
        snapshot,
    };
    let applied = pending.emit_if_pending(&key, || {
        let _ = tx.send(event);
    });

    if applied {
        debug!(%key, cached_at = %cached.cached_at, "Updated from cache");
    } else {
        debug!(%key, "Discarded cached response, live data already applied");
    }
}

async fn request_live(
    live: Arc<dyn ForecastSource>,
    pending: PendingRequests,
    url: String,
    key: String,
    label: String,
    tx: mpsc::UnboundedSender<SnapshotEvent>,
) {
    let snapshot = match live.fetch(&url).await {
        Ok(body) => match parse_forecast(&body, &key, &label) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!(%key, error = %e, "Ignoring unparsable live response");
                return;
            }
        },
        Err(e) => {
            // Leaves the flag set so a cache hit can still fill in offline
            debug!(%key, error = %e, "Live request failed");
            return;
        }
    };

    let event = SnapshotEvent {
        source: Source::Live,
        snapshot,
    };
    pending.complete_and_emit(&key, || {
        let _ = tx.send(event);
    });
    debug!(%key, "Updated from network");
}
