//! Inbound command surface.
//!
//! JSON messages mirroring the UI/platform message types. Every command
//! gets exactly one response; malformed input is answered with an error
//! status and touches no in-flight state.

use chrono::{DateTime, Utc};
use sentinel_intercept::{ActionStatus, RequestEvent};
use sentinel_log::{
    ComprehensiveData, RequestLogEntry, ScriptAnalysis, ScriptLogEntry, StatsSnapshot,
    VerdictLogEntry,
};
use sentinel_settings::Settings;
use serde::{Deserialize, Serialize};

/// Everything the UI or the platform can ask of the shield.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Platform reported a new outbound request.
    #[serde(rename_all = "camelCase")]
    RequestStarted { request: RequestEvent },
    /// Platform reported a request finished.
    #[serde(rename_all = "camelCase")]
    RequestCompleted { request_id: String },
    /// A tab started loading a new document.
    #[serde(rename_all = "camelCase")]
    ContextNavigated { tab_id: i64 },
    #[serde(rename_all = "camelCase")]
    UserActionForward { request_id: String },
    #[serde(rename_all = "camelCase")]
    UserActionDrop { request_id: String },
    #[serde(rename_all = "camelCase")]
    ScriptAnalysisResult { tab_id: i64, data: ScriptAnalysis },
    GetStats,
    GetComprehensiveData,
    GetRequestLogs,
    GetThreatLogs,
    GetScriptLogs,
    GetBlockedUrls,
    GetSettings,
    UpdateSettings { settings: Settings },
    ToggleInterception,
    ClearLogs,
    ClearBlockedUrls,
    Ping,
}

/// Status tokens carried by command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Success,
    Error,
    Cleared,
    Forwarded,
    Dropped,
    NoOp,
    Processed,
}

impl From<ActionStatus> for Status {
    fn from(status: ActionStatus) -> Self {
        match status {
            ActionStatus::Forwarded => Status::Forwarded,
            ActionStatus::Dropped => Status::Dropped,
            ActionStatus::NoOp => Status::NoOp,
        }
    }
}

/// One response per command.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Status {
        status: Status,
    },
    Error {
        status: Status,
        error: String,
    },
    Toggled {
        status: Status,
        enabled: bool,
    },
    Pong {
        #[serde(rename = "type")]
        kind: &'static str,
        status: Status,
        timestamp: DateTime<Utc>,
    },
    Stats(StatsSnapshot),
    Comprehensive(Box<ComprehensiveData>),
    RequestLogs(Vec<RequestLogEntry>),
    VerdictLogs(Vec<VerdictLogEntry>),
    ScriptLogs(Vec<ScriptLogEntry>),
    BlockedUrls(Vec<String>),
    Settings(Settings),
}

impl Response {
    pub fn status(status: Status) -> Self {
        Self::Status { status }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            status: Status::Error,
            error: message.into(),
        }
    }

    pub fn pong() -> Self {
        Self::Pong {
            kind: "PONG",
            status: Status::Success,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let command: Command = serde_json::from_str(
            r#"{
                "type": "REQUEST_STARTED",
                "request": {
                    "id": "r1",
                    "url": "https://example.com/",
                    "method": "GET",
                    "tab": 7,
                    "timestamp": "2024-05-01T12:00:00Z"
                }
            }"#,
        )
        .unwrap();
        assert!(matches!(command, Command::RequestStarted { .. }));

        let command: Command =
            serde_json::from_str(r#"{"type": "USER_ACTION_DROP", "requestId": "r9"}"#).unwrap();
        match command {
            Command::UserActionDrop { request_id } => assert_eq!(request_id, "r9"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let result = serde_json::from_str::<Command>(r#"{"type": "NOT_A_COMMAND"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&Response::status(Status::NoOp)).unwrap(),
            r#"{"status":"no-op"}"#
        );
        let json = serde_json::to_string(&Response::error("bad input")).unwrap();
        assert_eq!(json, r#"{"status":"error","error":"bad input"}"#);
    }
}
