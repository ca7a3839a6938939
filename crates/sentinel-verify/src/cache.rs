//! Per-hostname cache of raw reputation responses.
//!
//! Stores the last response per hostname for the lifetime of the process;
//! there is no expiry. Concurrent lookups for the same hostname may both
//! reach the network, in which case the last write wins — both writes carry
//! the same classification, so the race is harmless.

use crate::client::ScanResponse;
use std::collections::HashMap;
use std::sync::RwLock;

/// Raw reputation responses keyed by hostname.
#[derive(Debug, Default)]
pub struct ScanCache {
    inner: RwLock<HashMap<String, ScanResponse>>,
}

impl ScanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, hostname: &str) -> Option<ScanResponse> {
        self.inner.read().unwrap().get(hostname).cloned()
    }

    pub fn insert(&self, hostname: &str, response: ScanResponse) {
        self.inner
            .write()
            .unwrap()
            .insert(hostname.to_string(), response);
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.inner.write().unwrap().clear();
    }
}
