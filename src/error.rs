/*============================================================
  Synvera Project: Syn-Syu
  Module: synsyu_watch::error
  Etiquette: Synvera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise Syn-Syu-Watch error types so every check failure
    carries a stable category and an actionable message.

  Security / Safety Notes:
    Error contexts carry the manifest URL and upstream cause
    only; no request headers or local paths beyond config.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across the checker, fetcher and configuration layers;
    the binary maps categories onto exit codes.

  Revision History:
    2026-10-19 COD  Established watch error taxonomy.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - Failures contained at the check boundary
    - Stable exit codes for operational tooling
============================================================*/

use std::process::ExitCode;

use thiserror::Error;

/// Result alias for Syn-Syu-Watch operations.
pub type Result<T> = std::result::Result<T, SynsyuError>;

/// Enumerates error domains surfaced by the update watch service.
#[derive(Debug, Error)]
pub enum SynsyuError {
    #[error("Fetch: request to {url} failed: {reason}")]
    Fetch { url: String, reason: String },
    #[error("Read: response body from {url} unreadable: {reason}")]
    Read { url: String, reason: String },
    #[error("Parse: malformed version manifest: {0}")]
    Parse(String),
    #[error("Version `{input}` is not semantically parseable: {reason}")]
    VersionParse { input: String, reason: String },
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Runtime: {0}")]
    Runtime(String),
    #[error("Update checks are disabled")]
    Disabled,
    #[error("Update checker cancelled")]
    Cancelled,
}

impl SynsyuError {
    /// True when the error only reports an orderly shutdown.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SynsyuError::Cancelled)
    }

    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SynsyuError::Cancelled | SynsyuError::Disabled => ExitCode::SUCCESS,
            SynsyuError::Config(_) => ExitCode::from(20),
            SynsyuError::Fetch { .. } => ExitCode::from(30),
            SynsyuError::Read { .. } => ExitCode::from(31),
            SynsyuError::Parse(_) => ExitCode::from(32),
            SynsyuError::VersionParse { .. } => ExitCode::from(33),
            SynsyuError::Filesystem(_) => ExitCode::from(40),
            SynsyuError::Runtime(_) => ExitCode::from(50),
        }
    }
}
