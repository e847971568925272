//! Process-local cache tier.

use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Entry {
    payload: String,
    expires_at: Instant,
}

/// In-process cache with per-entry expiry.
///
/// Entries are evicted lazily on read; [`purge_expired`](Self::purge_expired)
/// sweeps the whole map for long-lived processes.
pub struct LocalCache {
    entries: DashMap<String, Entry>,
    default_ttl: Duration,
}

impl LocalCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// Look up a live entry, evicting it if expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(entry.payload.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    /// Insert an entry with an explicit TTL, or the default when `None`.
    pub fn set(&self, key: impl Into<String>, payload: impl Into<String>, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.entries.insert(
            key.into(),
            Entry {
                payload: payload.into(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop all entries whose TTL has elapsed.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    /// Remove everything, e.g. when caching is disabled at runtime.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let cache = LocalCache::new(Duration::from_secs(60));
        cache.set("k", "v", None);
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn expired_entry_misses_and_evicts() {
        let cache = LocalCache::new(Duration::from_secs(60));
        cache.set("k", "v", Some(Duration::ZERO));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_drops_only_expired() {
        let cache = LocalCache::new(Duration::from_secs(60));
        cache.set("live", "v", None);
        cache.set("dead", "v", Some(Duration::ZERO));
        cache.purge_expired();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("live").as_deref(), Some("v"));
    }

    #[test]
    fn clear_empties_the_map() {
        let cache = LocalCache::new(Duration::from_secs(60));
        cache.set("a", "1", None);
        cache.set("b", "2", None);
        cache.clear();
        assert!(cache.is_empty());
    }
}
