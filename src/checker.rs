/*============================================================
  Synavera Project: Syn-Syu
  Module: synsyu_watch::checker
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Poll the published release manifest on a fixed cadence and
    expose whether a newer Syn-Syu build is available.

  Security / Safety Notes:
    Detection only; nothing is downloaded or installed. Remote
    data is parsed into two strings and never executed.

  Dependencies:
    tokio for the timer, tokio-util for cancellation,
    parking_lot for the published result, tracing for spans.

  Operational Scope:
    Started and joined by the supervisor binary; read from any
    thread through the accessor methods.

  Revision History:
    2026-10-19 COD  Authored update checker service.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Check failures logged, never propagated out of the loop
    - Results replaced whole under a single writer lock
    - Cancellation observed only between checks
============================================================*/

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::field::{display, Empty};
use tracing::Instrument;

use crate::config::CheckerConfig;
use crate::error::{Result, SynsyuError};
use crate::fetch::{HttpFetcher, ManifestFetcher};
use crate::instrumentation::{FetchMetrics, InstrumentedFetcher};
use crate::logger::{millis, Logger};
use crate::version::{self, RemoteVersionInfo};

/// Latest published verdict. Replaced as a whole on every successful check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub has_update: bool,
    /// Empty until the first successful check.
    pub latest_version: String,
    pub checked_at: Option<DateTime<Utc>>,
}

/// Lifecycle of one checker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Created,
    Disabled,
    Running,
    Stopped,
}

/// Inputs driving the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    Start { enabled: bool },
    Tick,
    Cancel,
}

/// What the loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Check,
    Idle,
    Stop,
}

impl ServiceState {
    /// Pure transition function for the polling loop.
    pub fn on(self, event: LoopEvent) -> (ServiceState, LoopAction) {
        use LoopAction::*;
        use ServiceState::*;

        match (self, event) {
            (Created, LoopEvent::Start { enabled: true }) => (Running, Check),
            (Created, LoopEvent::Start { enabled: false }) => (Disabled, Stop),
            (Created, LoopEvent::Cancel) => (Stopped, Stop),
            (Running, LoopEvent::Tick) => (Running, Check),
            (Running, LoopEvent::Cancel) => (Stopped, Stop),
            (Disabled, _) => (Disabled, Stop),
            (Stopped, _) => (Stopped, Stop),
            (state, _) => (state, Idle),
        }
    }
}

/// Background service that tracks the latest published release.
pub struct UpdateChecker<F = InstrumentedFetcher<HttpFetcher>> {
    enabled: bool,
    running_version: String,
    manifest_url: String,
    poll_interval: Duration,
    fetcher: F,
    logger: Arc<Logger>,
    state: Mutex<ServiceState>,
    /// Held from fetch through publish so checks never overlap.
    check_gate: tokio::sync::Mutex<()>,
    result: RwLock<CheckResult>,
}

impl UpdateChecker {
    /// Build the production checker: reqwest transport wrapped in metrics.
    pub fn from_config(
        config: &CheckerConfig,
        logger: Arc<Logger>,
        metrics: Arc<FetchMetrics>,
    ) -> Result<Self> {
        config.validate()?;
        let fetcher = InstrumentedFetcher::new(HttpFetcher::new(config)?, metrics);
        Ok(Self::with_fetcher(config, fetcher, logger))
    }
}

impl<F: ManifestFetcher> UpdateChecker<F> {
    pub fn with_fetcher(config: &CheckerConfig, fetcher: F, logger: Arc<Logger>) -> Self {
        Self {
            enabled: config.enabled,
            running_version: config.running_version.clone(),
            manifest_url: config.manifest_url.clone(),
            poll_interval: config.poll_interval(),
            fetcher,
            logger,
            state: Mutex::new(ServiceState::Created),
            check_gate: tokio::sync::Mutex::new(()),
            result: RwLock::new(CheckResult::default()),
        }
    }

    pub fn is_disabled(&self) -> bool {
        !self.enabled
    }

    pub fn running_version(&self) -> &str {
        &self.running_version
    }

    pub fn state(&self) -> ServiceState {
        *self.state.lock()
    }

    /// Whether the last completed check found a newer release.
    pub fn update_available(&self) -> bool {
        self.result.read().has_update
    }

    /// Latest version seen on the relevant channel, empty before the first check.
    pub fn latest_version(&self) -> String {
        self.result.read().latest_version.clone()
    }

    /// Consistent copy of the published result.
    pub fn snapshot(&self) -> CheckResult {
        self.result.read().clone()
    }

    /// Run the polling loop until `cancel` fires.
    ///
    /// One check runs immediately, then one per poll interval. Individual
    /// check failures are logged and swallowed. The token is only observed
    /// between checks, so an in-flight fetch finishes (bounded by the HTTP
    /// timeout) before the loop exits.
    ///
    /// Returns [`SynsyuError::Cancelled`] on shutdown and
    /// [`SynsyuError::Disabled`] without checking when the service is disabled.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        match self.advance(LoopEvent::Start {
            enabled: self.enabled,
        }) {
            LoopAction::Check => {}
            _ if self.state() == ServiceState::Disabled => return Err(SynsyuError::Disabled),
            _ => {
                return Err(SynsyuError::Runtime(format!(
                    "Update checker cannot start from state {:?}",
                    self.state()
                )))
            }
        }

        self.logger.info(
            "START",
            format!(
                "Watching {} every {}s for {}",
                self.manifest_url,
                self.poll_interval.as_secs(),
                self.running_version
            ),
        );
        let _ = self.check_now().await;

        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => LoopEvent::Cancel,
                _ = ticker.tick() => LoopEvent::Tick,
            };
            match self.advance(event) {
                LoopAction::Check => {
                    let _ = self.check_now().await;
                }
                LoopAction::Idle => {}
                LoopAction::Stop => break,
            }
        }

        self.logger.info("STOP", "Update checker stopped.");
        Err(SynsyuError::Cancelled)
    }

    /// Perform one traced check, logging the outcome.
    ///
    /// The error is returned for callers that want it; the published
    /// result is untouched on failure. Waits for any check already in
    /// flight, and refuses to touch the network when disabled.
    pub async fn check_now(&self) -> Result<CheckResult> {
        if !self.enabled {
            return Err(SynsyuError::Disabled);
        }
        let start = Instant::now();
        let span = tracing::info_span!(
            "updatechecker.check_for_updates",
            running = %self.running_version,
            otel.status_code = Empty,
            error = Empty
        );

        let outcome = self.check_for_updates().instrument(span.clone()).await;
        let elapsed = start.elapsed();

        match &outcome {
            Ok(result) => {
                span.record("otel.status_code", "OK");
                self.logger.info(
                    "CHECK_OK",
                    format!(
                        "Update check succeeded latest={} update={} duration={}",
                        result.latest_version,
                        result.has_update,
                        millis(elapsed)
                    ),
                );
            }
            Err(err) => {
                span.record("otel.status_code", "ERROR");
                span.record("error", display(err));
                self.logger.error(
                    "CHECK_FAIL",
                    format!(
                        "Update check failed error={err} duration={}",
                        millis(elapsed)
                    ),
                );
            }
        }

        outcome
    }

    async fn check_for_updates(&self) -> Result<CheckResult> {
        let _gate = self.check_gate.lock().await;
        self.logger
            .debug("CHECK", format!("Checking {} for updates", self.manifest_url));

        let body = self.fetcher.fetch(&self.manifest_url).await?;
        let remote = RemoteVersionInfo::from_slice(&body)?;
        let comparison = version::compare(&self.running_version, &remote);

        if let Some(reason) = &comparison.fallback_reason {
            self.logger.debug(
                "VERSION_FALLBACK",
                format!("Using textual comparison on {} channel: {reason}", comparison.channel),
            );
        }
        if comparison.diverged() {
            self.logger.warn(
                "VERSION_DIVERGE",
                format!(
                    "running={} latest={} textual={} semantic={}; semantic verdict used",
                    self.running_version,
                    comparison.latest_version,
                    comparison.textual_update,
                    comparison.has_update
                ),
            );
        }

        let result = CheckResult {
            has_update: comparison.has_update,
            latest_version: comparison.latest_version,
            checked_at: Some(Utc::now()),
        };
        self.publish(result.clone());
        Ok(result)
    }

    fn publish(&self, result: CheckResult) {
        *self.result.write() = result;
    }

    fn advance(&self, event: LoopEvent) -> LoopAction {
        let mut state = self.state.lock();
        let (next, action) = state.on(event);
        *state = next;
        action
    }
}
