//! Converts malicious verdicts into standing block rules.

use crate::rule::{url_to_filter, BlockRule, BLOCKED_RESOURCE_TYPES};
use crate::store::{RuleStore, RuleStoreError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

/// First identifier handed out for dynamic rules. The range below the
/// offset is reserved for rules installed by other sources.
pub const DEFAULT_RULE_ID_OFFSET: u32 = 10_000;

/// Priority assigned to every dynamic block rule.
pub const DEFAULT_RULE_PRIORITY: u32 = 1;

/// Installs block rules and remembers their identifiers for bulk retraction.
///
/// Identifiers are strictly increasing for the lifetime of the process and
/// are never reused, including across [`clear_all`].
///
/// [`clear_all`]: RuleEnforcer::clear_all
pub struct RuleEnforcer<S> {
    store: S,
    next_rule_id: AtomicU32,
    installed: Mutex<Vec<u32>>,
}

impl<S: RuleStore> RuleEnforcer<S> {
    pub fn new(store: S) -> Self {
        Self::with_id_offset(store, DEFAULT_RULE_ID_OFFSET)
    }

    /// Seed the identifier counter explicitly (from configuration).
    pub fn with_id_offset(store: S, offset: u32) -> Self {
        Self {
            store,
            next_rule_id: AtomicU32::new(offset),
            installed: Mutex::new(Vec::new()),
        }
    }

    /// Install a block rule for a URL; returns the new rule id.
    ///
    /// The identifier counter advances even when the store rejects the
    /// submission — ids are never reused, rejected or not.
    pub async fn install_block(&self, url: &str) -> Result<u32, RuleStoreError> {
        let filter = url_to_filter(url);
        let id = self.next_rule_id.fetch_add(1, Ordering::Relaxed);

        let rule = BlockRule {
            id,
            priority: DEFAULT_RULE_PRIORITY,
            url_filter: filter,
            resource_types: BLOCKED_RESOURCE_TYPES.to_vec(),
        };

        self.store.install(rule).await?;
        self.installed.lock().unwrap().push(id);
        debug!("installed block rule {} for {}", id, url);
        Ok(id)
    }

    /// Retract every rule this enforcer installed, in one batch.
    ///
    /// Returns the number of rules retracted. On a composite store failure
    /// the installed set is kept intact so the next call retries the same
    /// batch.
    pub async fn clear_all(&self) -> Result<usize, RuleStoreError> {
        let ids: Vec<u32> = self.installed.lock().unwrap().clone();
        if ids.is_empty() {
            return Ok(0);
        }

        self.store.retract(&ids).await?;

        // Rules installed while the retraction was in flight stay remembered.
        self.installed
            .lock()
            .unwrap()
            .retain(|id| !ids.contains(id));
        info!("retracted {} block rules", ids.len());
        Ok(ids.len())
    }

    /// Identifiers currently remembered for retraction.
    pub fn installed_ids(&self) -> Vec<u32> {
        self.installed.lock().unwrap().clone()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
