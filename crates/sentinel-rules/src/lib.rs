//! Dynamic block rules for Sentinel Shield.
//!
//! Converts malicious verdicts into standing, origin+path-scoped block
//! rules and manages the lifetime of every rule it installs. The concrete
//! enforcement substrate sits behind the [`RuleStore`] trait.

mod enforcer;
mod rule;
mod store;

pub use enforcer::{RuleEnforcer, DEFAULT_RULE_ID_OFFSET, DEFAULT_RULE_PRIORITY};
pub use rule::{url_to_filter, BlockRule, ResourceType, BLOCKED_RESOURCE_TYPES};
pub use store::{InMemoryRuleStore, RuleStore, RuleStoreError};
