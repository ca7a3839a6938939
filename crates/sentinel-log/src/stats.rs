//! Aggregate counters kept alongside the logs.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifetime counters for the shield. Cheap to bump from any thread.
#[derive(Debug, Default)]
pub struct ShieldStats {
    threats_blocked: AtomicU64,
    scripts_analyzed: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl ShieldStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pending request was dropped by the operator.
    pub fn record_threat_blocked(&self) {
        self.threats_blocked.fetch_add(1, Ordering::Relaxed);
    }

    /// A script-analysis summary covering `count` scripts arrived.
    pub fn record_scripts_analyzed(&self, count: u64) {
        self.scripts_analyzed.fetch_add(count, Ordering::Relaxed);
    }

    /// The verdict cache answered without a network round trip.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// The verdict cache had nothing; a remote lookup was issued.
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            threats_blocked: self.threats_blocked.load(Ordering::Relaxed),
            scripts_analyzed: self.scripts_analyzed.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters, as handed to the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub threats_blocked: u64,
    pub scripts_analyzed: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = ShieldStats::new();
        stats.record_threat_blocked();
        stats.record_threat_blocked();
        stats.record_scripts_analyzed(5);
        stats.record_cache_hit();
        stats.record_cache_miss();

        let snap = stats.snapshot();
        assert_eq!(snap.threats_blocked, 2);
        assert_eq!(snap.scripts_analyzed, 5);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.cache_misses, 1);
    }
}
