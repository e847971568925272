//! Remote (shared) cache tier.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, warn};

/// A shared cache reachable by multiple processes.
///
/// Both operations are best-effort: implementations swallow transport
/// errors and report them as a miss (`None`) or a dropped write (`false`).
#[async_trait]
pub trait RemoteTier: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    /// Write a value with a TTL in seconds. Returns whether the write took.
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> bool;
}

/// Redis-backed remote tier.
pub struct RedisTier {
    manager: ConnectionManager,
    prefix: String,
}

impl RedisTier {
    /// Connect to Redis at `url`, namespacing all keys under `prefix`.
    ///
    /// Returns `None` when the server is unreachable; the caller falls back
    /// to local-only caching.
    pub async fn connect(url: &str, prefix: impl Into<String>) -> Option<Self> {
        let client = match redis::Client::open(url) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "invalid redis url; remote cache disabled");
                return None;
            }
        };
        match client.get_connection_manager().await {
            Ok(manager) => Some(Self {
                manager,
                prefix: prefix.into(),
            }),
            Err(e) => {
                warn!(error = %e, "redis unreachable; remote cache disabled");
                None
            }
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }
}

#[async_trait]
impl RemoteTier for RedisTier {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.manager.clone();
        match conn.get::<_, Option<String>>(self.namespaced(key)).await {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "remote cache read failed");
                None
            }
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> bool {
        let mut conn = self.manager.clone();
        match conn
            .set_ex::<_, _, ()>(self.namespaced(key), value, ttl_seconds)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "remote cache write failed");
                false
            }
        }
    }
}
