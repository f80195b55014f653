/*============================================================
  Synavera Project: Syn-Syu
  Module: synsyu_watch::fetch
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Retrieve the raw release manifest over HTTPS behind a
    narrow trait so the checker never depends on the transport.

  Security / Safety Notes:
    Performs read-only, unauthenticated GET requests. Every
    request is bounded by the configured timeout.

  Dependencies:
    reqwest for HTTP, async-trait for the fetcher seam.

  Operational Scope:
    Wrapped by the instrumentation layer and owned by the
    update checker.

  Revision History:
    2026-10-19 COD  Split transport from the checker.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Transport and body failures reported separately
    - Response released on every path
============================================================*/

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::CheckerConfig;
use crate::error::{Result, SynsyuError};

/// Capability to fetch the bytes behind a URL.
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    /// Fetch the complete body at `url`.
    ///
    /// Transport failures and non-success statuses yield
    /// [`SynsyuError::Fetch`]; failures while reading the body yield
    /// [`SynsyuError::Read`].
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// reqwest-backed fetcher used in production.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Construct a new client from configuration.
    pub fn new(config: &CheckerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|err| SynsyuError::Runtime(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ManifestFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| SynsyuError::Fetch {
                url: url.to_string(),
                reason: err.to_string(),
            })?;

        // `bytes()` consumes the response, so the connection is released
        // whether or not the body arrives intact.
        response.bytes().await.map_err(|err| SynsyuError::Read {
            url: url.to_string(),
            reason: err.to_string(),
        })
    }
}
