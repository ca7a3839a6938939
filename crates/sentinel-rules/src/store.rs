//! Rule store boundary.
//!
//! The store is the enforcement substrate (platform rule engine, kernel
//! filter, proxy). The shield only submits rules and retracts batches of
//! identifiers; installation mechanics live behind this trait.

use crate::rule::BlockRule;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use thiserror::Error;

/// Errors from rule-store operations.
#[derive(Debug, Error)]
pub enum RuleStoreError {
    #[error("rule {0} is already installed")]
    Duplicate(u32),

    #[error("rule store rejected the submission: {0}")]
    Rejected(String),

    #[error("rule store unavailable: {0}")]
    Unavailable(String),
}

/// Enforcement substrate the enforcer submits rules to.
pub trait RuleStore: Send + Sync + 'static {
    /// Install a single rule.
    fn install(
        &self,
        rule: BlockRule,
    ) -> impl Future<Output = Result<(), RuleStoreError>> + Send;

    /// Retract a batch of rules by id.
    ///
    /// Ids that are absent (already retracted or never installed) are
    /// ignored; an error means the store rejected the batch as a whole.
    fn retract(&self, ids: &[u32]) -> impl Future<Output = Result<(), RuleStoreError>> + Send;
}

/// In-memory rule store used by the binary and in tests.
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    rules: Mutex<HashMap<u32, BlockRule>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.rules.lock().unwrap().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.rules.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.lock().unwrap().is_empty()
    }

    /// Installed rules, ordered by id.
    pub fn rules(&self) -> Vec<BlockRule> {
        let mut rules: Vec<BlockRule> = self.rules.lock().unwrap().values().cloned().collect();
        rules.sort_by_key(|rule| rule.id);
        rules
    }
}

impl RuleStore for InMemoryRuleStore {
    async fn install(&self, rule: BlockRule) -> Result<(), RuleStoreError> {
        let mut rules = self.rules.lock().unwrap();
        if rules.contains_key(&rule.id) {
            return Err(RuleStoreError::Duplicate(rule.id));
        }
        rules.insert(rule.id, rule);
        Ok(())
    }

    async fn retract(&self, ids: &[u32]) -> Result<(), RuleStoreError> {
        let mut rules = self.rules.lock().unwrap();
        for id in ids {
            // Absent ids are tolerated.
            rules.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::BLOCKED_RESOURCE_TYPES;

    fn rule(id: u32) -> BlockRule {
        BlockRule {
            id,
            priority: 1,
            url_filter: format!("https://evil.test/{}", id),
            resource_types: BLOCKED_RESOURCE_TYPES.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_install_and_retract() {
        let store = InMemoryRuleStore::new();
        store.install(rule(1)).await.unwrap();
        store.install(rule(2)).await.unwrap();
        assert_eq!(store.len(), 2);

        store.retract(&[1, 2]).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = InMemoryRuleStore::new();
        store.install(rule(5)).await.unwrap();

        let err = store.install(rule(5)).await.unwrap_err();
        assert!(matches!(err, RuleStoreError::Duplicate(5)));
    }

    #[tokio::test]
    async fn test_retracting_absent_ids_is_tolerated() {
        let store = InMemoryRuleStore::new();
        store.install(rule(1)).await.unwrap();

        // Batch mixes installed, retracted, and never-seen ids.
        store.retract(&[1, 99, 1000]).await.unwrap();
        assert!(store.is_empty());
    }
}
