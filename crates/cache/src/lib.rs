//! Two-tier cache for tool-call results.
//!
//! Lookups consult the remote tier first (when configured), then the
//! process-local tier. Writes always land in the local tier so a remote
//! outage degrades to process-local caching rather than total cache loss.
//! Every remote failure is swallowed: caching is strictly best-effort and
//! must never fail the dispatch that uses it.

mod key;
mod local;
mod remote;
mod tiered;

pub use key::canonical_key;
pub use local::LocalCache;
pub use remote::{RedisTier, RemoteTier};
pub use tiered::TieredCache;

/// Default entry lifetime when no explicit TTL is supplied.
pub const DEFAULT_TTL_SECONDS: u64 = 86_400;
