//! Remote-then-local lookup over both cache tiers.

use crate::{DEFAULT_TTL_SECONDS, LocalCache, RemoteTier};
use std::time::Duration;
use tracing::debug;

/// The cache surface the dispatch loop talks to.
///
/// Reads try the remote tier first; a remote hit is not mirrored down
/// except via the normal [`set`](Self::set) path. Writes always land in the
/// local tier even when the remote write succeeds.
pub struct TieredCache {
    local: LocalCache,
    remote: Option<Box<dyn RemoteTier>>,
    default_ttl: Duration,
}

impl TieredCache {
    pub fn new(remote: Option<Box<dyn RemoteTier>>, default_ttl: Option<Duration>) -> Self {
        let default_ttl = default_ttl.unwrap_or(Duration::from_secs(DEFAULT_TTL_SECONDS));
        Self {
            local: LocalCache::new(default_ttl),
            remote,
            default_ttl,
        }
    }

    /// Local-only cache, used when no remote tier is configured.
    pub fn local_only(default_ttl: Option<Duration>) -> Self {
        Self::new(None, default_ttl)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        if let Some(remote) = &self.remote {
            if let Some(payload) = remote.get(key).await {
                debug!(key, "remote cache hit");
                return Some(payload);
            }
        }
        self.local.get(key)
    }

    pub async fn set(&self, key: &str, payload: &str, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        if let Some(remote) = &self.remote {
            remote.set_ex(key, payload, ttl.as_secs()).await;
        }
        // Local write is the safety net for remote outages.
        self.local.set(key, payload, Some(ttl));
    }

    pub fn clear_local(&self) {
        self.local.clear();
    }

    pub fn local_len(&self) -> usize {
        self.local.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dashmap::DashMap;

    /// In-memory stand-in for Redis.
    struct FakeRemote {
        entries: DashMap<String, String>,
        healthy: bool,
    }

    impl FakeRemote {
        fn new(healthy: bool) -> Self {
            Self {
                entries: DashMap::new(),
                healthy,
            }
        }
    }

    #[async_trait]
    impl RemoteTier for FakeRemote {
        async fn get(&self, key: &str) -> Option<String> {
            if !self.healthy {
                return None;
            }
            self.entries.get(key).map(|v| v.value().clone())
        }

        async fn set_ex(&self, key: &str, value: &str, _ttl_seconds: u64) -> bool {
            if !self.healthy {
                return false;
            }
            self.entries.insert(key.into(), value.into());
            true
        }
    }

    #[tokio::test]
    async fn set_writes_both_tiers() {
        let cache = TieredCache::new(Some(Box::new(FakeRemote::new(true))), None);
        cache.set("k", "v", None).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
        assert_eq!(cache.local_len(), 1);
    }

    #[tokio::test]
    async fn remote_outage_degrades_to_local() {
        let cache = TieredCache::new(Some(Box::new(FakeRemote::new(false))), None);
        cache.set("k", "v", None).await;
        // Remote dropped the write; the local safety net still serves it.
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn local_only_round_trip() {
        let cache = TieredCache::local_only(None);
        cache.set("k", "v", None).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn ttl_elapsed_reports_miss() {
        let cache = TieredCache::local_only(None);
        cache.set("k", "v", Some(Duration::ZERO)).await;
        assert_eq!(cache.get("k").await, None);
    }
}
