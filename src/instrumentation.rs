/*============================================================
  Synavera Project: Syn-Syu
  Module: synsyu_watch::instrumentation
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Count manifest requests, their outcomes and latency under
    a fixed metric namespace.

  Security / Safety Notes:
    Records counts and timings only; URLs and bodies are not
    retained.

  Dependencies:
    std atomics, serde for snapshots, tracing for fetch events.

  Operational Scope:
    Handle is created once by the supervisor and injected into
    the fetcher wrapper; snapshots feed shutdown summaries.

  Revision History:
    2026-10-19 COD  Replaced global registry with injected handle.
  ------------------------------------------------------------
  SSE Principles Observed:
    - No process-wide mutable registries
    - Lock-free counters on the request path
============================================================*/

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::error::Result;
use crate::fetch::ManifestFetcher;

/// Namespace every checker metric is reported under.
pub const METRIC_NAMESPACE: &str = "synsyu_update_checker";

/// Request counters for one fetcher.
#[derive(Debug)]
pub struct FetchMetrics {
    namespace: String,
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    latency_ms_total: AtomicU64,
    last_latency_ms: AtomicU64,
}

/// Point-in-time copy of [`FetchMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub latency_ms_total: u64,
    pub last_latency_ms: u64,
}

impl FetchMetrics {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            requests: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            latency_ms_total: AtomicU64::new(0),
            last_latency_ms: AtomicU64::new(0),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Record one completed request.
    pub fn observe(&self, elapsed: Duration, success: bool) {
        let millis = whole_millis(elapsed);
        self.requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        self.latency_ms_total.fetch_add(millis, Ordering::Relaxed);
        self.last_latency_ms.store(millis, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            latency_ms_total: self.latency_ms_total.load(Ordering::Relaxed),
            last_latency_ms: self.last_latency_ms.load(Ordering::Relaxed),
        }
    }

    /// Prometheus-style exposition text.
    pub fn render(&self) -> String {
        let snap = self.snapshot();
        let ns = &self.namespace;
        let mut out = String::new();
        let _ = writeln!(out, "{ns}_requests_total {}", snap.requests);
        let _ = writeln!(
            out,
            "{ns}_requests_outcome_total{{outcome=\"success\"}} {}",
            snap.successes
        );
        let _ = writeln!(
            out,
            "{ns}_requests_outcome_total{{outcome=\"error\"}} {}",
            snap.failures
        );
        let _ = writeln!(out, "{ns}_request_latency_ms_sum {}", snap.latency_ms_total);
        let _ = writeln!(out, "{ns}_request_latency_ms_last {}", snap.last_latency_ms);
        out
    }
}

/// Milliseconds in `elapsed`, saturating at `u64::MAX`.
fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

impl Default for FetchMetrics {
    fn default() -> Self {
        Self::new(METRIC_NAMESPACE)
    }
}

/// Fetcher wrapper that records every request into [`FetchMetrics`].
pub struct InstrumentedFetcher<F> {
    inner: F,
    metrics: Arc<FetchMetrics>,
}

impl<F: ManifestFetcher> InstrumentedFetcher<F> {
    pub fn new(inner: F, metrics: Arc<FetchMetrics>) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl<F: ManifestFetcher> ManifestFetcher for InstrumentedFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let start = Instant::now();
        let result = self.inner.fetch(url).await;
        let elapsed = start.elapsed();
        self.metrics.observe(elapsed, result.is_ok());
        tracing::debug!(
            namespace = %self.metrics.namespace(),
            url,
            success = result.is_ok(),
            elapsed_ms = whole_millis(elapsed),
            "manifest request finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SynsyuError;

    struct Scripted {
        fail: bool,
    }

    #[async_trait]
    impl ManifestFetcher for Scripted {
        async fn fetch(&self, url: &str) -> Result<Bytes> {
            if self.fail {
                Err(SynsyuError::Fetch {
                    url: url.to_string(),
                    reason: "refused".into(),
                })
            } else {
                Ok(Bytes::from_static(b"{}"))
            }
        }
    }

    #[tokio::test]
    async fn records_success_and_failure_outcomes() {
        let metrics = Arc::new(FetchMetrics::default());
        let ok = InstrumentedFetcher::new(Scripted { fail: false }, metrics.clone());
        let bad = InstrumentedFetcher::new(Scripted { fail: true }, metrics.clone());

        ok.fetch("https://example.invalid").await.unwrap();
        ok.fetch("https://example.invalid").await.unwrap();
        assert!(bad.fetch("https://example.invalid").await.is_err());

        let snap = metrics.snapshot();
        assert_eq!(snap.requests, 3);
        assert_eq!(snap.successes, 2);
        assert_eq!(snap.failures, 1);
    }

    #[tokio::test]
    async fn wrapper_passes_errors_through_untouched() {
        let fetcher = InstrumentedFetcher::new(
            Scripted { fail: true },
            Arc::new(FetchMetrics::default()),
        );
        let err = fetcher.fetch("https://example.invalid").await.unwrap_err();
        assert!(matches!(err, SynsyuError::Fetch { reason, .. } if reason == "refused"));
    }

    #[test]
    fn oversized_durations_saturate_instead_of_wrapping() {
        assert_eq!(whole_millis(Duration::from_millis(1_500)), 1_500);
        assert_eq!(whole_millis(Duration::MAX), u64::MAX);

        let metrics = FetchMetrics::default();
        metrics.observe(Duration::MAX, true);
        assert_eq!(metrics.snapshot().last_latency_ms, u64::MAX);
    }

    #[test]
    fn render_uses_namespace_prefix() {
        let metrics = FetchMetrics::new("test_ns");
        metrics.observe(Duration::from_millis(40), true);
        metrics.observe(Duration::from_millis(60), false);
        let text = metrics.render();
        assert!(text.contains("test_ns_requests_total 2"));
        assert!(text.contains("test_ns_requests_outcome_total{outcome=\"error\"} 1"));
        assert!(text.contains("test_ns_request_latency_ms_sum 100"));
        assert!(text.contains("test_ns_request_latency_ms_last 60"));
        assert!(text.lines().all(|line| line.starts_with("test_ns_")));
    }
}
