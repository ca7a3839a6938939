//! Remote reputation lookup.
//!
//! Queries a urlscan.io-style search API over HTTPS with rustls
//! (memory-safe TLS) and a hard timeout. The transport owns the timeout:
//! a slow or unreachable service resolves to an error, never a hang.

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{ACCEPT, HOST, USER_AGENT};
use hyper::{Method, Request, Uri};
use rustls::ClientConfig;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

/// Errors from a remote reputation query.
///
/// Every variant resolves to the fail-open path in the verification engine.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("reputation API returned status {0}")]
    BadStatus(u16),

    #[error("malformed reputation response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("reputation query timed out")]
    Timeout,
}

/// Raw search response from the reputation API.
///
/// Only the verdict flags are deserialized; everything else in the payload
/// is ignored. Missing fields default to the benign shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanResponse {
    pub results: Vec<ScanResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanResult {
    pub verdicts: ScanVerdicts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanVerdicts {
    pub overall: OverallVerdict,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverallVerdict {
    pub malicious: bool,
}

impl ScanResponse {
    /// True when any result carries a positive malicious flag.
    pub fn is_malicious(&self) -> bool {
        self.results
            .iter()
            .any(|result| result.verdicts.overall.malicious)
    }
}

/// Boundary trait for the remote reputation source.
///
/// Tests substitute a scripted implementation; production uses
/// [`UrlscanClient`].
pub trait ReputationClient: Send + Sync + 'static {
    /// Query the reputation source for a hostname.
    fn lookup(
        &self,
        hostname: &str,
    ) -> impl Future<Output = Result<ScanResponse, VerifyError>> + Send;
}

/// Reputation client configuration.
#[derive(Debug, Clone)]
pub struct ReputationConfig {
    /// API host queried for domain reputation.
    pub api_host: String,
    /// Hard deadline for the whole query.
    pub timeout: Duration,
    /// User-Agent string.
    pub user_agent: String,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            api_host: "urlscan.io".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: "SentinelShield/0.1".to_string(),
        }
    }
}

/// HTTPS client for the urlscan.io search API.
pub struct UrlscanClient {
    config: ReputationConfig,
}

impl UrlscanClient {
    pub fn new(config: ReputationConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ReputationConfig::default())
    }

    async fn fetch(&self, hostname: &str) -> Result<ScanResponse, VerifyError> {
        let host = &self.config.api_host;
        let uri: Uri = format!("https://{}/api/v1/search/?q=domain:{}", host, hostname)
            .parse()
            .map_err(|e: hyper::http::uri::InvalidUri| VerifyError::InvalidUrl(e.to_string()))?;

        let request = Request::builder()
            .method(Method::GET)
            .uri(&uri)
            .header(USER_AGENT, &self.config.user_agent)
            .header(ACCEPT, "application/json")
            .header(HOST, host.as_str())
            .body(Full::new(Bytes::new()))
            .map_err(|e| VerifyError::Http(e.to_string()))?;

        let stream = tokio::net::TcpStream::connect((host.as_str(), 443))
            .await
            .map_err(|e| VerifyError::ConnectionFailed(e.to_string()))?;

        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls_config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let connector = TlsConnector::from(Arc::new(tls_config));
        let server_name = rustls::pki_types::ServerName::try_from(host.clone())
            .map_err(|_| VerifyError::Tls("invalid server name".to_string()))?;
        let tls_stream = connector
            .connect(server_name, stream)
            .await
            .map_err(|e| VerifyError::Tls(e.to_string()))?;

        let io = hyper_util::rt::TokioIo::new(tls_stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| VerifyError::Http(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                warn!("reputation connection error: {}", e);
            }
        });

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| VerifyError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::BadStatus(status.as_u16()));
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| VerifyError::Http(e.to_string()))?
            .to_bytes();

        debug!("reputation lookup for {}: {} bytes", hostname, body.len());
        Ok(serde_json::from_slice(&body)?)
    }
}

impl ReputationClient for UrlscanClient {
    async fn lookup(&self, hostname: &str) -> Result<ScanResponse, VerifyError> {
        tokio::time::timeout(self.config.timeout, self.fetch(hostname))
            .await
            .map_err(|_| VerifyError::Timeout)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malicious_flag_detection() {
        let response: ScanResponse = serde_json::from_str(
            r#"{"results": [
                {"verdicts": {"overall": {"malicious": false}}},
                {"verdicts": {"overall": {"malicious": true}}}
            ]}"#,
        )
        .unwrap();
        assert!(response.is_malicious());
    }

    #[test]
    fn test_empty_results_are_safe() {
        let response: ScanResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(!response.is_malicious());

        // A payload with no results field at all is also safe.
        let response: ScanResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(!response.is_malicious());
    }

    #[test]
    fn test_partial_verdict_shapes_default_to_safe() {
        let response: ScanResponse = serde_json::from_str(
            r#"{"results": [{"verdicts": {}}, {}]}"#,
        )
        .unwrap();
        assert!(!response.is_malicious());
    }
}
