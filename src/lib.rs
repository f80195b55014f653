/*============================================================
  Synavera Project: Syn-Syu
  Module: synsyu_watch
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Background release watch for Syn-Syu: polls the published
    manifest and reports whether a newer build is available.

  Security / Safety Notes:
    Detection only. No update is ever downloaded or applied,
    and no state is persisted between runs.

  Dependencies:
    See individual modules.

  Operational Scope:
    Linked by the `synsyu-watch` supervisor binary and by any
    host that wants to surface update availability.

  Revision History:
    2026-10-19 COD  Established watch library surface.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit dependency injection at construction
    - Last known good state survives failed checks
============================================================*/

pub mod checker;
pub mod config;
pub mod error;
pub mod fetch;
pub mod instrumentation;
pub mod logger;
pub mod version;

pub use checker::{CheckResult, ServiceState, UpdateChecker};
pub use config::{CheckerConfig, SynsyuConfig};
pub use error::{Result, SynsyuError};
pub use fetch::{HttpFetcher, ManifestFetcher};
pub use instrumentation::{FetchMetrics, InstrumentedFetcher, MetricsSnapshot, METRIC_NAMESPACE};
pub use logger::Logger;
pub use version::{compare, Channel, Comparison, RemoteVersionInfo};
