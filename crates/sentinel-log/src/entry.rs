//! Log entry vocabulary shared across the shield.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Action taken on an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestAction {
    /// Request observed and recorded in the pending table.
    Intercepted,
    /// Asynchronous verification classified the target as malicious.
    ThreatDetected,
    /// Operator let the request through.
    Forwarded,
    /// Operator discarded the request.
    Dropped,
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intercepted => write!(f, "intercepted"),
            Self::ThreatDetected => write!(f, "threat_detected"),
            Self::Forwarded => write!(f, "forwarded"),
            Self::Dropped => write!(f, "dropped"),
        }
    }
}

/// Which source produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerdictSource {
    LocalBlacklist,
    LocalWhitelist,
    Cache,
    RemoteApi,
}

impl fmt::Display for VerdictSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalBlacklist => write!(f, "local-blacklist"),
            Self::LocalWhitelist => write!(f, "local-whitelist"),
            Self::Cache => write!(f, "cache"),
            Self::RemoteApi => write!(f, "remote-api"),
        }
    }
}

/// Classification outcome for a URL.
///
/// `Error` records that classification was attempted and failed; it never
/// enters the verdict cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictResult {
    Safe,
    Malicious,
    Error,
}

impl fmt::Display for VerdictResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "safe"),
            Self::Malicious => write!(f, "malicious"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One action applied to an intercepted request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLogEntry {
    pub time: DateTime<Utc>,
    pub url: String,
    pub tab_id: i64,
    pub action: RequestAction,
}

/// One classification recorded for a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictLogEntry {
    pub time: DateTime<Utc>,
    pub url: String,
    pub source: VerdictSource,
    pub result: VerdictResult,
}

/// Summary of a page script scan, delivered by the content-script collaborator.
///
/// The scan itself (pattern matching over script text) happens in the page;
/// the shield only ingests the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScriptAnalysis {
    pub total_scripts: usize,
    pub suspicious_scripts: Vec<String>,
    pub details: Vec<SuspiciousScript>,
}

/// Why one script was flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspiciousScript {
    pub script: String,
    pub reason: String,
}

/// One script-analysis summary for a tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptLogEntry {
    pub time: DateTime<Utc>,
    pub tab_id: i64,
    pub analysis: ScriptAnalysis,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serializes_snake_case() {
        let json = serde_json::to_string(&RequestAction::ThreatDetected).unwrap();
        assert_eq!(json, "\"threat_detected\"");
    }

    #[test]
    fn test_source_serializes_kebab_case() {
        let json = serde_json::to_string(&VerdictSource::LocalBlacklist).unwrap();
        assert_eq!(json, "\"local-blacklist\"");
    }

    #[test]
    fn test_analysis_accepts_partial_payload() {
        // Content scripts may omit fields; everything defaults.
        let analysis: ScriptAnalysis = serde_json::from_str(r#"{"totalScripts": 3}"#).unwrap();
        assert_eq!(analysis.total_scripts, 3);
        assert!(analysis.suspicious_scripts.is_empty());
    }
}
