//! Verdict resolution.
//!
//! Resolution order, first match wins: local blacklist, local whitelist,
//! cache, remote API. Local lists always take precedence over anything the
//! cache or the network says.

use crate::cache::ScanCache;
use crate::client::ReputationClient;
use crate::lists::LocalLists;
use chrono::{DateTime, Utc};
use sentinel_log::{Logger, VerdictResult, VerdictSource};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// One classification produced for a URL.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub url: String,
    pub source: VerdictSource,
    pub result: VerdictResult,
    pub time: DateTime<Utc>,
}

impl Verdict {
    pub fn is_malicious(&self) -> bool {
        self.result == VerdictResult::Malicious
    }

    /// Fail-open reading: anything that is not explicitly malicious is safe.
    pub fn is_safe(&self) -> bool {
        !self.is_malicious()
    }
}

/// Produces verdicts and records each one in the decision log.
pub struct VerificationEngine<C> {
    lists: LocalLists,
    cache: ScanCache,
    client: C,
    logger: Arc<Logger>,
}

impl<C: ReputationClient> VerificationEngine<C> {
    pub fn new(lists: LocalLists, client: C, logger: Arc<Logger>) -> Self {
        Self {
            lists,
            cache: ScanCache::new(),
            client,
            logger,
        }
    }

    /// Classify a URL. Never fails: remote errors and unparseable URLs
    /// degrade to a safe classification with an `error` verdict entry.
    pub async fn verify(&self, url: &str) -> Verdict {
        let Some(hostname) = hostname_of(url) else {
            warn!("unparseable URL, failing open: {}", url);
            return self.record(url, VerdictSource::RemoteApi, VerdictResult::Error);
        };

        if self.lists.is_blacklisted(&hostname) {
            return self.record(url, VerdictSource::LocalBlacklist, VerdictResult::Malicious);
        }
        if self.lists.is_whitelisted(&hostname) {
            return self.record(url, VerdictSource::LocalWhitelist, VerdictResult::Safe);
        }

        if let Some(cached) = self.cache.get(&hostname) {
            debug!("verdict cache hit for {}", hostname);
            self.logger.record_cache_hit();
            let result = if cached.is_malicious() {
                VerdictResult::Malicious
            } else {
                VerdictResult::Safe
            };
            return self.record(url, VerdictSource::Cache, result);
        }

        self.logger.record_cache_miss();
        match self.client.lookup(&hostname).await {
            Ok(response) => {
                let result = if response.is_malicious() {
                    VerdictResult::Malicious
                } else {
                    VerdictResult::Safe
                };
                self.cache.insert(&hostname, response);
                self.record(url, VerdictSource::RemoteApi, result)
            }
            Err(e) => {
                // Fail-open: an error verdict is logged but never cached.
                warn!("reputation lookup failed for {}: {}", hostname, e);
                self.record(url, VerdictSource::RemoteApi, VerdictResult::Error)
            }
        }
    }

    pub fn cache(&self) -> &ScanCache {
        &self.cache
    }

    fn record(&self, url: &str, source: VerdictSource, result: VerdictResult) -> Verdict {
        self.logger.log_verdict(url, source, result);
        Verdict {
            url: url.to_string(),
            source,
            result,
            time: Utc::now(),
        }
    }
}

/// Hostname of a URL, lowercased. None when the URL does not parse or has
/// no host component.
fn hostname_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(|host| host.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{OverallVerdict, ScanResponse, ScanResult, ScanVerdicts, VerifyError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted reputation source: a fixed answer plus a call counter.
    struct StubClient {
        malicious: bool,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubClient {
        fn safe() -> Self {
            Self {
                malicious: false,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn malicious() -> Self {
            Self {
                malicious: true,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                malicious: false,
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ReputationClient for StubClient {
        async fn lookup(&self, _hostname: &str) -> Result<ScanResponse, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(VerifyError::Timeout);
            }
            Ok(ScanResponse {
                results: vec![ScanResult {
                    verdicts: ScanVerdicts {
                        overall: OverallVerdict {
                            malicious: self.malicious,
                        },
                    },
                }],
            })
        }
    }

    fn engine_with(lists: LocalLists, client: StubClient) -> VerificationEngine<StubClient> {
        VerificationEngine::new(lists, client, Arc::new(Logger::with_defaults()))
    }

    #[tokio::test]
    async fn test_blacklist_wins_without_network() {
        let engine = engine_with(LocalLists::with_defaults(), StubClient::safe());

        let verdict = engine.verify("https://malicious-domain.com/x").await;
        assert!(verdict.is_malicious());
        assert_eq!(verdict.source, VerdictSource::LocalBlacklist);
        assert_eq!(engine.client.calls(), 0);
    }

    #[tokio::test]
    async fn test_whitelist_wins_without_network() {
        let engine = engine_with(LocalLists::with_defaults(), StubClient::malicious());

        let verdict = engine.verify("https://google.com/search?q=x").await;
        assert!(verdict.is_safe());
        assert_eq!(verdict.source, VerdictSource::LocalWhitelist);
        assert_eq!(engine.client.calls(), 0);
    }

    #[tokio::test]
    async fn test_blacklist_overrides_cached_safe() {
        let mut lists = LocalLists::new();
        lists.add_blacklisted("flipped.test");
        let engine = engine_with(lists, StubClient::safe());
        // A benign response is already cached for the hostname.
        engine.cache.insert("flipped.test", ScanResponse::default());

        let verdict = engine.verify("https://flipped.test/page").await;
        assert!(verdict.is_malicious());
        assert_eq!(verdict.source, VerdictSource::LocalBlacklist);
    }

    #[tokio::test]
    async fn test_remote_result_is_cached_and_reused() {
        let engine = engine_with(LocalLists::new(), StubClient::malicious());

        let first = engine.verify("https://evil.test/a").await;
        assert!(first.is_malicious());
        assert_eq!(first.source, VerdictSource::RemoteApi);

        // Same hostname, different path: answered from cache.
        let second = engine.verify("https://evil.test/b?x=1").await;
        assert!(second.is_malicious());
        assert_eq!(second.source, VerdictSource::Cache);
        assert_eq!(engine.client.calls(), 1);

        let stats = engine.logger.stats();
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_hits, 1);
    }

    #[tokio::test]
    async fn test_fail_open_on_transport_error() {
        let engine = engine_with(LocalLists::new(), StubClient::failing());

        let verdict = engine.verify("https://x.test/a").await;
        assert!(verdict.is_safe());
        assert_eq!(verdict.result, VerdictResult::Error);

        // Exactly one error entry, no safe/malicious entries.
        let entries = engine.logger.verdict_logs(50);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].result, VerdictResult::Error);

        // Errors never enter the cache, so the next call queries again.
        assert!(engine.cache.is_empty());
        engine.verify("https://x.test/a").await;
        assert_eq!(engine.client.calls(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_url_fails_open() {
        let engine = engine_with(LocalLists::new(), StubClient::safe());

        let verdict = engine.verify("not a url").await;
        assert!(verdict.is_safe());
        assert_eq!(verdict.result, VerdictResult::Error);
        assert_eq!(engine.client.calls(), 0);
    }
}
