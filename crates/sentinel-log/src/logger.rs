//! The decision log itself: three bounded append-only logs plus counters.

use crate::entry::{
    RequestAction, RequestLogEntry, ScriptAnalysis, ScriptLogEntry, VerdictLogEntry,
    VerdictResult, VerdictSource,
};
use crate::stats::{ShieldStats, StatsSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::debug;

/// Entries retained per log before the oldest are discarded.
pub const DEFAULT_MAX_ENTRIES: usize = 200;

/// Append-only sink for request actions, verdicts, and script analyses.
///
/// Appends never fail and never block the decision path; readers get the
/// most recent tail of each log. Retention is bounded, so the logger is
/// safe to keep for the lifetime of the process.
#[derive(Debug)]
pub struct Logger {
    requests: Mutex<VecDeque<RequestLogEntry>>,
    verdicts: Mutex<VecDeque<VerdictLogEntry>>,
    scripts: Mutex<VecDeque<ScriptLogEntry>>,
    stats: ShieldStats,
    max_entries: usize,
}

impl Logger {
    pub fn new(max_entries: usize) -> Self {
        Self {
            requests: Mutex::new(VecDeque::new()),
            verdicts: Mutex::new(VecDeque::new()),
            scripts: Mutex::new(VecDeque::new()),
            stats: ShieldStats::new(),
            max_entries,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }

    /// Record an action applied to an intercepted request.
    ///
    /// Dropping a request counts toward the threats-blocked total.
    pub fn log_request_action(&self, url: &str, tab_id: i64, action: RequestAction) {
        debug!("request {}: {}", action, url);
        if action == RequestAction::Dropped {
            self.stats.record_threat_blocked();
        }

        let mut requests = self.requests.lock().unwrap();
        requests.push_back(RequestLogEntry {
            time: Utc::now(),
            url: url.to_string(),
            tab_id,
            action,
        });
        Self::trim(&mut requests, self.max_entries);
    }

    /// Record a threat-intelligence verdict.
    pub fn log_verdict(&self, url: &str, source: VerdictSource, result: VerdictResult) {
        debug!("verdict for {}: {} ({})", url, result, source);

        let mut verdicts = self.verdicts.lock().unwrap();
        verdicts.push_back(VerdictLogEntry {
            time: Utc::now(),
            url: url.to_string(),
            source,
            result,
        });
        Self::trim(&mut verdicts, self.max_entries);
    }

    /// Record a script-analysis summary for a tab.
    pub fn log_script_analysis(&self, tab_id: i64, analysis: ScriptAnalysis) {
        self.stats
            .record_scripts_analyzed(analysis.total_scripts as u64);

        let mut scripts = self.scripts.lock().unwrap();
        scripts.push_back(ScriptLogEntry {
            time: Utc::now(),
            tab_id,
            analysis,
        });
        Self::trim(&mut scripts, self.max_entries);
    }

    pub fn record_cache_hit(&self) {
        self.stats.record_cache_hit();
    }

    pub fn record_cache_miss(&self) {
        self.stats.record_cache_miss();
    }

    /// Last `limit` request entries, oldest first.
    pub fn request_logs(&self, limit: usize) -> Vec<RequestLogEntry> {
        Self::tail(&self.requests.lock().unwrap(), limit)
    }

    /// Last `limit` verdict entries, oldest first.
    pub fn verdict_logs(&self, limit: usize) -> Vec<VerdictLogEntry> {
        Self::tail(&self.verdicts.lock().unwrap(), limit)
    }

    /// Last `limit` script-analysis entries, oldest first.
    pub fn script_logs(&self, limit: usize) -> Vec<ScriptLogEntry> {
        Self::tail(&self.scripts.lock().unwrap(), limit)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Everything the UI needs in one call.
    pub fn comprehensive_data(&self, limit: usize) -> ComprehensiveData {
        let summary = {
            let requests = self.requests.lock().unwrap();
            let verdicts = self.verdicts.lock().unwrap();
            let scripts = self.scripts.lock().unwrap();
            ActivitySummary {
                total_requests: requests.len(),
                total_threats: verdicts.len(),
                total_analyses: scripts.len(),
                last_activity: requests.back().map(|entry| entry.time),
            }
        };

        ComprehensiveData {
            stats: self.stats(),
            request_logs: self.request_logs(limit),
            threat_logs: self.verdict_logs(limit),
            script_logs: self.script_logs(limit),
            summary,
        }
    }

    /// Empty all three logs. Counters survive a clear.
    pub fn clear(&self) {
        self.requests.lock().unwrap().clear();
        self.verdicts.lock().unwrap().clear();
        self.scripts.lock().unwrap().clear();
        debug!("logs cleared");
    }

    fn trim<T>(log: &mut VecDeque<T>, max: usize) {
        while log.len() > max {
            log.pop_front();
        }
    }

    fn tail<T: Clone>(log: &VecDeque<T>, limit: usize) -> Vec<T> {
        log.iter()
            .skip(log.len().saturating_sub(limit))
            .cloned()
            .collect()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Aggregated view for the UI collaborator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveData {
    pub stats: StatsSnapshot,
    pub request_logs: Vec<RequestLogEntry>,
    pub threat_logs: Vec<VerdictLogEntry>,
    pub script_logs: Vec<ScriptLogEntry>,
    pub summary: ActivitySummary,
}

/// Totals over the retained entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub total_requests: usize,
    pub total_threats: usize,
    pub total_analyses: usize,
    pub last_activity: Option<DateTime<Utc>>,
}
