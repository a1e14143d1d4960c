use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub mod config;
pub mod report;
pub mod strategy;

pub use config::{MutationConfig, NormalizerConfig, ProbeConfig, KNOWN_IDS};
pub use report::{
    DocumentProbeResult, IdStructureReport, PatternReport, ProbeFailure, SweepReport,
    UniquenessReport,
};
pub use strategy::Strategy;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("invalid noise pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    /// Timeout for the whole request (connect + body).
    pub timeout_ms: Option<u64>,
    /// Hard cap on bytes read from the response body.
    pub max_bytes: Option<u64>,
    /// Optional extra headers (best-effort; invalid names/values are dropped).
    pub headers: BTreeMap<String, String>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: None,
            max_bytes: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    /// URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// UTF-8 decode of the body regardless of any declared charset; invalid bytes become U+FFFD.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).to_string()
    }
}

/// One GET against the remote document host. Redirects are followed by the backend.
///
/// Implementations return `Err` only for transport-level failures (DNS, connect, timeout,
/// body read). Any HTTP status, including 4xx/5xx, is a successful fetch.
#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

/// Delay primitive used between probes of a batch.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, dur: Duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_any_2xx() {
        let mut r = FetchResponse {
            url: "http://x/".to_string(),
            final_url: "http://x/".to_string(),
            status: 200,
            content_type: None,
            bytes: b"hi".to_vec(),
            truncated: false,
        };
        assert!(r.is_success());
        r.status = 204;
        assert!(r.is_success());
        r.status = 301;
        assert!(!r.is_success());
        r.status = 404;
        assert!(!r.is_success());
    }

    #[test]
    fn fetch_request_timeout_maps_millis() {
        let mut req = FetchRequest::get("http://example.com/");
        assert_eq!(req.timeout(), None);
        req.timeout_ms = Some(1_500);
        assert_eq!(req.timeout(), Some(Duration::from_millis(1_500)));
    }
}
