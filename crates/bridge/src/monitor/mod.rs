//! Completion monitor: side-effect observation for early stop.
//!
//! Long multi-step tasks often make their real progress visible as an
//! artifact (a written report, a saved file) well before the provider's own
//! turn sequence converges. The monitor polls for that artifact and cancels
//! the concurrently running dispatch as soon as it looks complete.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Best-effort artifact access. I/O errors read as "not ready".
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;
    async fn read(&self, path: &Path) -> Option<Vec<u8>>;
}

/// Filesystem-backed artifact store.
#[derive(Debug, Default)]
pub struct FsArtifacts;

#[async_trait]
impl ArtifactStore for FsArtifacts {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read(&self, path: &Path) -> Option<Vec<u8>> {
        tokio::fs::read(path).await.ok()
    }
}

/// Polls for an expected artifact on a fixed interval.
#[derive(Debug, Clone)]
pub struct CompletionMonitor {
    interval: Duration,
    /// Artifacts below this size are treated as partial writes, not valid.
    min_bytes: u64,
}

impl CompletionMonitor {
    pub fn new(interval: Duration, min_bytes: u64) -> Self {
        Self { interval, min_bytes }
    }

    /// Watch for `path` to appear, reach the minimum size, and satisfy
    /// `valid`. On success, cancels `cancel` and returns `true`. Returns
    /// `false` on timeout, or when `cancel` fires first (the watched work
    /// finished on its own).
    pub async fn watch<F>(
        &self,
        store: &dyn ArtifactStore,
        path: &Path,
        valid: F,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> bool
    where
        F: Fn(&[u8]) -> bool + Send + Sync,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.ready(store, path, &valid).await {
                info!(path = %path.display(), "artifact observed, stopping early");
                cancel.cancel();
                return true;
            }
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep_until(deadline) => {
                    debug!(path = %path.display(), "monitor timed out");
                    return false;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    async fn ready<F>(&self, store: &dyn ArtifactStore, path: &Path, valid: &F) -> bool
    where
        F: Fn(&[u8]) -> bool + Send + Sync,
    {
        if !store.exists(path).await {
            return false;
        }
        let Some(bytes) = store.read(path).await else {
            return false;
        };
        if (bytes.len() as u64) < self.min_bytes {
            debug!(path = %path.display(), len = bytes.len(), "artifact below minimum size");
            return false;
        }
        valid(&bytes)
    }
}
