//! Static local threat lists.
//!
//! Consulted before the cache and the remote API; both lists match exact
//! hostnames and always win over any cached or remote classification.

use std::collections::HashSet;

/// Built-in known-bad hostnames.
const DEFAULT_BLACKLIST: &[&str] = &[
    "malicious-domain.com",
    "badexample.com",
    "suspicious-site.net",
    "malware-test.org",
    "phishing-example.com",
];

/// Built-in trusted hostnames, never queried remotely.
const DEFAULT_WHITELIST: &[&str] = &[
    "trusted.com",
    "google.com",
    "github.com",
    "stackoverflow.com",
    "mozilla.org",
];

/// Exact-match hostname allow/deny lists.
#[derive(Debug, Clone, Default)]
pub struct LocalLists {
    blacklist: HashSet<String>,
    whitelist: HashSet<String>,
}

impl LocalLists {
    /// Empty lists.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists seeded with the built-in hostnames.
    pub fn with_defaults() -> Self {
        let mut lists = Self::new();
        for domain in DEFAULT_BLACKLIST {
            lists.add_blacklisted(domain);
        }
        for domain in DEFAULT_WHITELIST {
            lists.add_whitelisted(domain);
        }
        lists
    }

    pub fn add_blacklisted(&mut self, hostname: &str) {
        self.blacklist.insert(normalize(hostname));
    }

    pub fn add_whitelisted(&mut self, hostname: &str) {
        self.whitelist.insert(normalize(hostname));
    }

    pub fn is_blacklisted(&self, hostname: &str) -> bool {
        self.blacklist.contains(&normalize(hostname))
    }

    pub fn is_whitelisted(&self, hostname: &str) -> bool {
        self.whitelist.contains(&normalize(hostname))
    }

    pub fn blacklist_len(&self) -> usize {
        self.blacklist.len()
    }

    pub fn whitelist_len(&self) -> usize {
        self.whitelist.len()
    }
}

fn normalize(hostname: &str) -> String {
    hostname.trim().to_lowercase()
}
