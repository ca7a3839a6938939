//! Intake for page script-analysis summaries.
//!
//! The scan itself runs in the page (a collaborator); the shield logs the
//! summary and raises an alert when anything suspicious was flagged.

use crate::event::{Notification, TabId};
use sentinel_log::{Logger, ScriptAnalysis};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Routes script-analysis results into the log and the notification stream.
pub struct ScriptChecker {
    logger: Arc<Logger>,
    notifications: broadcast::Sender<Notification>,
}

impl ScriptChecker {
    pub fn new(logger: Arc<Logger>, notifications: broadcast::Sender<Notification>) -> Self {
        Self {
            logger,
            notifications,
        }
    }

    /// Record an analysis result for a tab; alert when it flagged scripts.
    pub fn handle_analysis(&self, tab: TabId, analysis: ScriptAnalysis) {
        debug!(
            "script analysis for {}: {} scripts, {} suspicious",
            tab,
            analysis.total_scripts,
            analysis.suspicious_scripts.len()
        );
        self.logger.log_script_analysis(tab.raw(), analysis.clone());

        if !analysis.suspicious_scripts.is_empty() {
            // Best-effort; no subscriber is fine.
            let _ = self
                .notifications
                .send(Notification::ScriptAlert { tab, analysis });
        }
    }
}
