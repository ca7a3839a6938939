//! The interception pipeline.
//!
//! One instance owns the pending-request table, the per-tab index, and the
//! blocked-URL set. All mutation happens behind the instance's own locks,
//! so the pipeline is safe to share across tasks on any runtime flavor.

use crate::event::{ActionStatus, InterceptedRequest, Notification, RequestEvent, TabId};
use sentinel_log::{Logger, RequestAction};
use sentinel_rules::{RuleEnforcer, RuleStore};
use sentinel_settings::SettingsManager;
use sentinel_verify::{ReputationClient, VerificationEngine};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Buffered notifications per subscriber before the oldest are dropped.
pub const NOTIFICATION_CAPACITY: usize = 64;

/// Observes outbound requests and orchestrates verify-then-enforce.
pub struct Interceptor<C, S> {
    settings: Arc<SettingsManager>,
    logger: Arc<Logger>,
    verifier: Arc<VerificationEngine<C>>,
    enforcer: Arc<RuleEnforcer<S>>,
    pending: Mutex<HashMap<String, InterceptedRequest>>,
    by_tab: Mutex<HashMap<TabId, HashSet<String>>>,
    blocked_urls: Arc<Mutex<HashSet<String>>>,
    notifications: broadcast::Sender<Notification>,
}

impl<C: ReputationClient, S: RuleStore> Interceptor<C, S> {
    pub fn new(
        settings: Arc<SettingsManager>,
        logger: Arc<Logger>,
        verifier: Arc<VerificationEngine<C>>,
        enforcer: Arc<RuleEnforcer<S>>,
        notifications: broadcast::Sender<Notification>,
    ) -> Self {
        Self {
            settings,
            logger,
            verifier,
            enforcer,
            pending: Mutex::new(HashMap::new()),
            by_tab: Mutex::new(HashMap::new()),
            blocked_urls: Arc::new(Mutex::new(HashSet::new())),
            notifications,
        }
    }

    /// Receive future notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Observe an outbound request. Returns immediately; verification and
    /// enforcement proceed independently on a spawned task.
    ///
    /// No-op when interception is disabled. Requests with no originating
    /// tab are background traffic and are ignored entirely — never logged,
    /// never verified.
    pub fn on_request_started(&self, event: RequestEvent) {
        if !self.settings.interception_enabled() {
            return;
        }
        let Some(tab) = event.tab else {
            return;
        };

        let request = InterceptedRequest {
            id: event.id,
            url: event.url,
            method: event.method,
            tab,
            timestamp: event.timestamp,
        };

        self.logger
            .log_request_action(&request.url, tab.raw(), RequestAction::Intercepted);

        self.pending
            .lock()
            .unwrap()
            .insert(request.id.clone(), request.clone());
        self.by_tab
            .lock()
            .unwrap()
            .entry(tab)
            .or_default()
            .insert(request.id.clone());

        self.publish(Notification::NewInterceptedRequest {
            request: request.clone(),
        });

        if self.settings.block_malicious_urls() {
            tokio::spawn(verify_and_enforce(
                Arc::clone(&self.verifier),
                Arc::clone(&self.enforcer),
                Arc::clone(&self.logger),
                Arc::clone(&self.blocked_urls),
                self.notifications.clone(),
                request,
            ));
        }
    }

    /// The platform reports a request finished. Idempotent.
    pub fn on_request_completed(&self, request_id: &str) {
        let removed = self.pending.lock().unwrap().remove(request_id);
        if let Some(request) = removed {
            self.unindex(request.tab, request_id);
        }
    }

    /// Operator lets a pending request through.
    pub fn forward(&self, request_id: &str) -> ActionStatus {
        self.finish(request_id, RequestAction::Forwarded, ActionStatus::Forwarded)
    }

    /// Operator discards a pending request.
    pub fn drop_request(&self, request_id: &str) -> ActionStatus {
        self.finish(request_id, RequestAction::Dropped, ActionStatus::Dropped)
    }

    fn finish(&self, request_id: &str, action: RequestAction, status: ActionStatus) -> ActionStatus {
        let removed = self.pending.lock().unwrap().remove(request_id);
        let Some(request) = removed else {
            // Already completed or acted on; advisory actions don't error.
            return ActionStatus::NoOp;
        };
        self.unindex(request.tab, request_id);
        self.logger
            .log_request_action(&request.url, request.tab.raw(), action);
        status
    }

    /// A tab started loading a new document; its request bookkeeping is
    /// stale and is discarded.
    pub fn on_context_navigated(&self, tab: TabId) {
        let removed = self.by_tab.lock().unwrap().remove(&tab);
        let Some(ids) = removed else {
            return;
        };
        let mut pending = self.pending.lock().unwrap();
        for id in ids {
            pending.remove(&id);
        }
        debug!("cleared request state for {}", tab);
    }

    /// URLs that have been detected malicious this session.
    pub fn blocked_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.blocked_urls.lock().unwrap().iter().cloned().collect();
        urls.sort();
        urls
    }

    /// Reset the blocked-URL set and retract every installed rule.
    pub async fn clear_blocked_urls(&self) {
        self.blocked_urls.lock().unwrap().clear();
        if let Err(e) = self.enforcer.clear_all().await {
            // Rules stay remembered in the enforcer for the next attempt.
            warn!("failed to retract block rules: {}", e);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn enforcer(&self) -> &Arc<RuleEnforcer<S>> {
        &self.enforcer
    }

    fn unindex(&self, tab: TabId, request_id: &str) {
        let mut by_tab = self.by_tab.lock().unwrap();
        if let Some(ids) = by_tab.get_mut(&tab) {
            ids.remove(request_id);
            if ids.is_empty() {
                by_tab.remove(&tab);
            }
        }
    }

    fn publish(&self, notification: Notification) {
        // No subscriber is the normal case.
        let _ = self.notifications.send(notification);
    }
}

/// The asynchronous half of the pipeline, spawned per observed request.
///
/// Runs to completion even if the request finishes first; a late verdict
/// still has value and is logged either way.
async fn verify_and_enforce<C: ReputationClient, S: RuleStore>(
    verifier: Arc<VerificationEngine<C>>,
    enforcer: Arc<RuleEnforcer<S>>,
    logger: Arc<Logger>,
    blocked_urls: Arc<Mutex<HashSet<String>>>,
    notifications: broadcast::Sender<Notification>,
    request: InterceptedRequest,
) {
    let verdict = verifier.verify(&request.url).await;
    if !verdict.is_malicious() {
        // Safe and error verdicts are already in the verdict log.
        return;
    }

    logger.log_request_action(
        &request.url,
        request.tab.raw(),
        RequestAction::ThreatDetected,
    );
    blocked_urls.lock().unwrap().insert(request.url.clone());

    // The blocked-URL set reflects "detected malicious"; enforcement
    // failure is logged and does not undo the detection.
    match enforcer.install_block(&request.url).await {
        Ok(rule_id) => debug!("block rule {} installed for {}", rule_id, request.url),
        Err(e) => warn!("failed to install block rule for {}: {}", request.url, e),
    }

    let _ = notifications.send(Notification::ThreatDetected { request });
}
