//! Platform events, pending requests, and outbound notifications.

use chrono::{DateTime, Utc};
use sentinel_log::ScriptAnalysis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an originating browsing context (tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(pub i64);

impl TabId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tab({})", self.0)
    }
}

/// Outbound request reported by the platform hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEvent {
    /// Platform-assigned identifier, unique per request.
    pub id: String,
    pub url: String,
    pub method: String,
    /// Absent for background traffic that belongs to no tab.
    pub tab: Option<TabId>,
    pub timestamp: DateTime<Utc>,
}

/// A request the pipeline has observed and not yet seen complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptedRequest {
    pub id: String,
    pub url: String,
    pub method: String,
    pub tab: TabId,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of a terminal operator action on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionStatus {
    Forwarded,
    Dropped,
    /// The request was no longer pending; nothing happened.
    NoOp,
}

/// Best-effort broadcast to subscribers (the UI). Publishing with no
/// subscriber is the normal case, not an error.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    #[serde(rename_all = "camelCase")]
    NewInterceptedRequest { request: InterceptedRequest },
    #[serde(rename_all = "camelCase")]
    ThreatDetected { request: InterceptedRequest },
    #[serde(rename_all = "camelCase")]
    ScriptAlert {
        tab: TabId,
        analysis: ScriptAnalysis,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accepts_absent_tab() {
        let event: RequestEvent = serde_json::from_str(
            r#"{
                "id": "r1",
                "url": "https://example.com/",
                "method": "GET",
                "timestamp": "2024-05-01T12:00:00Z"
            }"#,
        )
        .unwrap();
        assert!(event.tab.is_none());
    }

    #[test]
    fn test_notification_wire_shape() {
        let notification = Notification::ScriptAlert {
            tab: TabId::new(3),
            analysis: ScriptAnalysis::default(),
        };
        let json = serde_json::to_string(&notification).unwrap();
        assert!(json.contains("\"type\":\"SCRIPT_ALERT\""));
    }
}
