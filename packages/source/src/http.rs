//! HTTP transport used by source layers.
//!
//! Layers only need a plain GET returning status, `Content-Type` and the
//! raw body. [`Transport`] is the seam; [`ReqwestTransport`] is the real
//! implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use crate::{SourceError, retry};

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Raw HTTP response as seen by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// `Content-Type` header value, if any.
    pub content_type: Option<String>,
    /// Undecoded body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A `200 OK` response with the given content type and body.
    #[must_use]
    pub fn ok(content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues HTTP GET requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url`.
    ///
    /// Non-success statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request could not be completed.
    async fn get(&self, url: &Url) -> Result<HttpResponse, SourceError>;
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// `User-Agent` header. Nominatim rejects requests without one.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra attempts for transient failures. `0` disables retries.
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("geoint-monitor/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 0,
        }
    }
}

impl ClientConfig {
    /// Reads settings from `GEOINT_USER_AGENT`, `GEOINT_HTTP_TIMEOUT_SECS`
    /// and `GEOINT_HTTP_MAX_RETRIES`, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads variables through
    /// `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(agent) = lookup("GEOINT_USER_AGENT").filter(|a| !a.trim().is_empty()) {
            config.user_agent = agent;
        }
        if let Some(secs) = parse_var(&lookup, "GEOINT_HTTP_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_var(&lookup, "GEOINT_HTTP_MAX_RETRIES") {
            config.max_retries = retries;
        }

        config
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let raw = lookup(name)?;
    raw.trim().parse().map_or_else(
        |_| {
            log::warn!("Ignoring {name}={raw}: not a valid number");
            None
        },
        Some,
    )
}

/// [`Transport`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    max_retries: u32,
}

impl ReqwestTransport {
    /// Builds a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: &ClientConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, SourceError> {
        let response = retry::send_with_retry(|| self.client.get(url.clone()), self.max_retries).await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.bytes().await?.to_vec();

        log::debug!("GET {url} -> {status} ({} bytes)", body.len());

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}
