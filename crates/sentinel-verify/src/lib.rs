//! URL verification for Sentinel Shield.
//!
//! Produces a safe/malicious determination for a URL with minimal latency,
//! preferring local, instantaneous sources:
//!
//! 1. Local blacklist (exact hostname) → malicious
//! 2. Local whitelist (exact hostname) → safe
//! 3. Cached reputation response for the hostname → reuse, no network
//! 4. Remote reputation query → classify and cache
//!
//! Every failure degrades to safe (fail-open): a reputation-service outage
//! must never break browsing.

mod cache;
mod client;
mod engine;
mod lists;

pub use cache::ScanCache;
pub use client::{
    OverallVerdict, ReputationClient, ReputationConfig, ScanResponse, ScanResult, ScanVerdicts,
    UrlscanClient, VerifyError,
};
pub use engine::{VerificationEngine, Verdict};
pub use lists::LocalLists;

pub use sentinel_log::{VerdictResult, VerdictSource};
