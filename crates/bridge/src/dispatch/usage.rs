//! Per-run tool usage accounting.

use dashmap::DashMap;
use std::collections::BTreeMap;
use tracing::info;

/// Counts tool invocations by tool name and by result source.
///
/// Cheap enough to share across tasks; all counters are lock-free maps.
#[derive(Debug, Default)]
pub struct UsageLedger {
    by_tool: DashMap<String, u64>,
    by_source: DashMap<String, u64>,
}

/// A point-in-time copy of the ledger, sorted for stable output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub by_tool: BTreeMap<String, u64>,
    pub by_source: BTreeMap<String, u64>,
}

impl UsageSnapshot {
    pub fn total(&self) -> u64 {
        self.by_tool.values().sum()
    }
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one resolved tool call and where its result came from
    /// (`"cache"`, `"extract"`, `"live"`).
    pub fn record(&self, tool: &str, source: &str) {
        *self.by_tool.entry(tool.to_string()).or_insert(0) += 1;
        *self.by_source.entry(source.to_string()).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            by_tool: self
                .by_tool
                .iter()
                .map(|e| (e.key().clone(), *e.value()))
                .collect(),
            by_source: self
                .by_source
                .iter()
                .map(|e| (e.key().clone(), *e.value()))
                .collect(),
        }
    }

    pub fn reset(&self) {
        self.by_tool.clear();
        self.by_source.clear();
    }

    /// Emit a one-line summary of the ledger at info level.
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        info!(
            total = snapshot.total(),
            by_tool = ?snapshot.by_tool,
            by_source = ?snapshot.by_source,
            "tool usage",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_snapshots() {
        let ledger = UsageLedger::new();
        ledger.record("lookup", "live");
        ledger.record("lookup", "cache");
        ledger.record("fetch", "extract");

        let snap = ledger.snapshot();
        assert_eq!(snap.total(), 3);
        assert_eq!(snap.by_tool.get("lookup"), Some(&2));
        assert_eq!(snap.by_tool.get("fetch"), Some(&1));
        assert_eq!(snap.by_source.get("cache"), Some(&1));
        assert_eq!(snap.by_source.get("live"), Some(&1));
    }

    #[test]
    fn reset_clears_counters() {
        let ledger = UsageLedger::new();
        ledger.record("lookup", "live");
        ledger.reset();
        assert_eq!(ledger.snapshot().total(), 0);
    }
}
