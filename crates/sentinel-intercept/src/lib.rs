//! Request interception pipeline.
//!
//! Observes every outbound request the platform reports, records it, and
//! schedules asynchronous verification without ever delaying the request
//! itself. Malicious verdicts escalate to the rule enforcer and are
//! broadcast to whatever UI happens to be listening.
//!
//! The observation hook is non-blocking by design: `on_request_started`
//! returns before any verification or enforcement work happens.

mod event;
mod pipeline;
mod scripts;

pub use event::{ActionStatus, InterceptedRequest, Notification, RequestEvent, TabId};
pub use pipeline::{Interceptor, NOTIFICATION_CAPACITY};
pub use scripts::ScriptChecker;
