/*============================================================
  Synavera Project: Syn-Syu
  Module: synsyu_watch::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load and validate the update watch configuration from TOML
    with built-in defaults for every recognised option.

  Security / Safety Notes:
    Only reads the configured file; the manifest URL must be an
    absolute http(s) endpoint.

  Dependencies:
    serde + toml for decoding, dirs for platform paths,
    reqwest::Url for endpoint validation.

  Operational Scope:
    Consumed by the supervisor binary when constructing the
    checker and session logger.

  Revision History:
    2026-10-19 COD  Introduced watch configuration.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit defaults for every option
    - Validation before any network activity
============================================================*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::{Result, SynsyuError};

/// Published Syn-Syu release manifest.
pub const DEFAULT_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/Synavera-Discorporated/Syn-Syu/main/latest.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SynsyuConfig {
    pub log_dir: Option<PathBuf>,
    pub checker: CheckerConfig,
}

/// Options recognised by the update checker.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Whether the polling loop ever runs.
    pub enabled: bool,
    /// Version string of the running instance.
    pub running_version: String,
    pub manifest_url: String,
    /// Per-request bound in seconds.
    pub timeout: u64,
    /// Seconds between checks.
    pub poll_interval: u64,
    pub user_agent: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            running_version: env!("CARGO_PKG_VERSION").to_string(),
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            poll_interval: DEFAULT_POLL_INTERVAL_SECS,
            user_agent: format!("Syn-Syu-Watch/{} (linux)", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CheckerConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    /// Reject settings that would stall or misdirect the loop.
    pub fn validate(&self) -> Result<()> {
        if self.timeout == 0 {
            return Err(SynsyuError::Config(
                "checker.timeout must be greater than zero".into(),
            ));
        }
        if self.poll_interval == 0 {
            return Err(SynsyuError::Config(
                "checker.poll_interval must be greater than zero".into(),
            ));
        }
        if self.running_version.trim().is_empty() {
            return Err(SynsyuError::Config(
                "checker.running_version must not be empty".into(),
            ));
        }
        let url = Url::parse(&self.manifest_url).map_err(|err| {
            SynsyuError::Config(format!(
                "checker.manifest_url `{}` is invalid: {err}",
                self.manifest_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SynsyuError::Config(format!(
                "checker.manifest_url must use http or https, got `{}`",
                url.scheme()
            )));
        }
        Ok(())
    }
}

impl SynsyuConfig {
    /// Load from an explicit path, or from the default location when present.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(explicit) => Self::load_from_path(explicit),
            None => match Self::default_path() {
                Some(default) if default.is_file() => Self::load_from_path(&default),
                _ => {
                    let config = Self::default();
                    config.checker.validate()?;
                    Ok(config)
                }
            },
        }
    }

    /// Parse and validate the TOML file at `path`.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            SynsyuError::Config(format!(
                "Failed to read configuration {}: {err}",
                path.display()
            ))
        })?;
        let config: SynsyuConfig = toml::from_str(&raw).map_err(|err| {
            SynsyuError::Config(format!(
                "Failed to parse configuration {}: {err}",
                path.display()
            ))
        })?;
        config.checker.validate()?;
        Ok(config)
    }

    /// `~/.config/syn-syu/watch.toml` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("syn-syu").join("watch.toml"))
    }

    pub fn log_dir(&self) -> PathBuf {
        if let Some(dir) = &self.log_dir {
            return dir.clone();
        }
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join("syn-syu")
            .join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_documented_cadence() {
        let config = CheckerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), Duration::from_secs(600));
        assert_eq!(config.manifest_url, DEFAULT_MANIFEST_URL);
        assert_eq!(config.running_version, env!("CARGO_PKG_VERSION"));
        config.validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let file = write_config(
            r#"
log_dir = "/var/log/syn-syu"

[checker]
enabled = false
running_version = "9.5.2-beta.1"
"#,
        );
        let config = SynsyuConfig::load_from_path(file.path()).unwrap();
        assert!(!config.checker.enabled);
        assert_eq!(config.checker.running_version, "9.5.2-beta.1");
        assert_eq!(config.checker.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.log_dir(), PathBuf::from("/var/log/syn-syu"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let file = write_config("[checker]\ntimeout = 0\n");
        let err = SynsyuConfig::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, SynsyuError::Config(msg) if msg.contains("timeout")));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = CheckerConfig {
            poll_interval: 0,
            ..CheckerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_http_manifest_url_is_rejected() {
        let config = CheckerConfig {
            manifest_url: "ftp://example.org/latest.json".into(),
            ..CheckerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http or https"));

        let relative = CheckerConfig {
            manifest_url: "latest.json".into(),
            ..CheckerConfig::default()
        };
        assert!(relative.validate().is_err());
    }

    #[test]
    fn blank_running_version_is_rejected() {
        let config = CheckerConfig {
            running_version: "  ".into(),
            ..CheckerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_explicit_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = SynsyuConfig::load_from_optional_path(Some(&missing)).unwrap_err();
        assert!(matches!(err, SynsyuError::Config(_)));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let file = write_config("[checker\nenabled = ");
        assert!(matches!(
            SynsyuConfig::load_from_path(file.path()),
            Err(SynsyuError::Config(_))
        ));
    }
}
