//! Snapshot cache for sources that load their entire dataset at once.
//!
//! The flat-file adapter does not query per hostname; it ingests the whole
//! export into memory and serves lookups from that snapshot. A snapshot is
//! replaced wholesale when it goes stale; there is no per-entry eviction.

use cg_core::AssetRecord;
use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::traits::SourceResult;

/// A timestamped, full-replacement snapshot of asset records keyed by
/// hostname. Lookups that find the snapshot stale (or absent) trigger a
/// reload through the caller-supplied loader before answering.
pub struct SnapshotCache {
    inner: RwLock<Option<Snapshot>>,
    freshness: Duration,
}

struct Snapshot {
    records: HashMap<String, AssetRecord>,
    loaded_at: Instant,
}

impl Snapshot {
    fn is_fresh(&self, freshness: Duration) -> bool {
        self.loaded_at.elapsed() < freshness
    }
}

impl SnapshotCache {
    /// Creates an empty cache whose snapshots stay valid for `freshness`.
    pub fn new(freshness: Duration) -> Self {
        Self {
            inner: RwLock::new(None),
            freshness,
        }
    }

    /// Looks up a hostname, reloading the snapshot through `load` first if
    /// no fresh snapshot exists. The loader returns the complete dataset;
    /// a successful load replaces the previous snapshot entirely. Loaders
    /// that do file or network IO should run it on the blocking pool.
    pub async fn lookup<F, Fut>(
        &self,
        hostname: &str,
        load: F,
    ) -> SourceResult<Option<AssetRecord>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SourceResult<HashMap<String, AssetRecord>>>,
    {
        {
            let guard = self.inner.read().await;
            if let Some(snapshot) = &*guard {
                if snapshot.is_fresh(self.freshness) {
                    return Ok(snapshot.records.get(hostname).cloned());
                }
            }
        }

        let mut guard = self.inner.write().await;
        // Another task may have reloaded while we waited for the write lock.
        if let Some(snapshot) = &*guard {
            if snapshot.is_fresh(self.freshness) {
                return Ok(snapshot.records.get(hostname).cloned());
            }
        }

        let records = load().await?;
        debug!(entries = records.len(), "snapshot reloaded");
        let result = records.get(hostname).cloned();
        *guard = Some(Snapshot {
            records,
            loaded_at: Instant::now(),
        });
        Ok(result)
    }

    /// Number of records in the current snapshot, if one is loaded.
    pub async fn len(&self) -> Option<usize> {
        let guard = self.inner.read().await;
        guard.as_ref().map(|s| s.records.len())
    }

    /// Whether a snapshot is loaded and still fresh.
    pub async fn is_fresh(&self) -> bool {
        let guard = self.inner.read().await;
        guard
            .as_ref()
            .map(|s| s.is_fresh(self.freshness))
            .unwrap_or(false)
    }

    /// Drops the current snapshot, forcing the next lookup to reload.
    pub async fn invalidate(&self) {
        let mut guard = self.inner.write().await;
        *guard = None;
    }
}
