//! Sentinel Shield core.
//!
//! Constructs one instance of every component, threads them together, and
//! dispatches inbound commands. There are no ambient singletons: tests
//! build isolated shields with scripted collaborators.

mod commands;

pub use commands::{Command, Response, Status};

use sentinel_intercept::{
    Interceptor, Notification, ScriptChecker, TabId, NOTIFICATION_CAPACITY,
};
use sentinel_log::Logger;
use sentinel_rules::{InMemoryRuleStore, RuleEnforcer, RuleStore};
use sentinel_settings::SettingsManager;
use sentinel_verify::{
    LocalLists, ReputationClient, UrlscanClient, VerificationEngine,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Log entries returned per read-back request.
pub const READBACK_LIMIT: usize = 50;

/// The assembled shield: pipeline, verifier, enforcer, logger, settings.
pub struct Shield<C, S> {
    settings: Arc<SettingsManager>,
    logger: Arc<Logger>,
    interceptor: Arc<Interceptor<C, S>>,
    scripts: ScriptChecker,
    notifications: broadcast::Sender<Notification>,
}

impl Shield<UrlscanClient, InMemoryRuleStore> {
    /// Production wiring: default lists, the urlscan.io client, and an
    /// in-memory rule store standing in for the platform rule engine.
    pub fn with_defaults(settings: Arc<SettingsManager>) -> Self {
        Self::new(
            settings,
            LocalLists::with_defaults(),
            UrlscanClient::with_defaults(),
            InMemoryRuleStore::new(),
        )
    }
}

impl<C: ReputationClient, S: RuleStore> Shield<C, S> {
    pub fn new(settings: Arc<SettingsManager>, lists: LocalLists, client: C, store: S) -> Self {
        let logger = Arc::new(Logger::new(settings.max_log_entries()));
        let verifier = Arc::new(VerificationEngine::new(lists, client, Arc::clone(&logger)));
        let enforcer = Arc::new(RuleEnforcer::new(store));
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        let interceptor = Arc::new(Interceptor::new(
            Arc::clone(&settings),
            Arc::clone(&logger),
            verifier,
            enforcer,
            notifications.clone(),
        ));
        let scripts = ScriptChecker::new(Arc::clone(&logger), notifications.clone());

        info!("shield assembled");
        Self {
            settings,
            logger,
            interceptor,
            scripts,
            notifications,
        }
    }

    /// Receive future outbound notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn interceptor(&self) -> &Arc<Interceptor<C, S>> {
        &self.interceptor
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// Handle one command and produce its response.
    pub async fn dispatch(&self, command: Command) -> Response {
        match command {
            Command::RequestStarted { request } => {
                self.interceptor.on_request_started(request);
                Response::status(Status::Processed)
            }
            Command::RequestCompleted { request_id } => {
                self.interceptor.on_request_completed(&request_id);
                Response::status(Status::Processed)
            }
            Command::ContextNavigated { tab_id } => {
                self.interceptor.on_context_navigated(TabId::new(tab_id));
                Response::status(Status::Processed)
            }
            Command::UserActionForward { request_id } => {
                Response::status(self.interceptor.forward(&request_id).into())
            }
            Command::UserActionDrop { request_id } => {
                Response::status(self.interceptor.drop_request(&request_id).into())
            }
            Command::ScriptAnalysisResult { tab_id, data } => {
                self.scripts.handle_analysis(TabId::new(tab_id), data);
                Response::status(Status::Processed)
            }
            Command::GetStats => Response::Stats(self.logger.stats()),
            Command::GetComprehensiveData => {
                Response::Comprehensive(Box::new(self.logger.comprehensive_data(READBACK_LIMIT)))
            }
            Command::GetRequestLogs => {
                Response::RequestLogs(self.logger.request_logs(READBACK_LIMIT))
            }
            Command::GetThreatLogs => {
                Response::VerdictLogs(self.logger.verdict_logs(READBACK_LIMIT))
            }
            Command::GetScriptLogs => Response::ScriptLogs(self.logger.script_logs(READBACK_LIMIT)),
            Command::GetBlockedUrls => Response::BlockedUrls(self.interceptor.blocked_urls()),
            Command::GetSettings => Response::Settings(self.settings.snapshot()),
            Command::UpdateSettings { settings } => match self.settings.update(settings) {
                Ok(()) => Response::status(Status::Success),
                Err(e) => Response::error(e.to_string()),
            },
            Command::ToggleInterception => match self.settings.toggle_interception() {
                Ok(enabled) => Response::Toggled {
                    status: Status::Success,
                    enabled,
                },
                Err(e) => Response::error(e.to_string()),
            },
            Command::ClearLogs => {
                self.logger.clear();
                Response::status(Status::Cleared)
            }
            Command::ClearBlockedUrls => {
                self.interceptor.clear_blocked_urls().await;
                Response::status(Status::Cleared)
            }
            Command::Ping => Response::pong(),
        }
    }
}
