/*============================================================
  Synavera Project: Syn-Syu
  Module: synsyu_watch::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Supervisor for the Syn-Syu release watch. Starts the update
    checker, forwards SIGINT/SIGTERM as cancellation and joins it.

  Security / Safety Notes:
    Operates within user privileges. Performs HTTPS GET requests
    to the configured manifest only.

  Dependencies:
    clap for CLI parsing, chrono for session stamps,
    tracing-subscriber for span output.

  Operational Scope:
    Run as a long-lived user service, or with `--once` from the
    Syn-Syu Bash layer for a single availability check.

  Revision History:
    2025-10-28 COD  Authored Syn-Syu Core runtime.
    2026-10-19 COD  Repurposed as watch supervisor.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{ArgAction, Parser};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use synsyu_watch::{
    CheckResult, FetchMetrics, Logger, Result, SynsyuConfig, SynsyuError, UpdateChecker,
    METRIC_NAMESPACE,
};

/// Command-line arguments for Syn-Syu-Watch.
#[derive(Debug, Parser)]
#[command(
    name = "Syn-Syu-Watch",
    version,
    author = "Synavera Systems",
    about = "Release watch for Syn-Syu"
)]
struct Cli {
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Version to compare against instead of the configured one.
    #[arg(long, value_name = "VERSION")]
    running_version: Option<String>,
    /// Override the release manifest endpoint.
    #[arg(long, value_name = "URL")]
    manifest_url: Option<String>,
    /// Disable polling regardless of configuration.
    #[arg(long, action = ArgAction::SetTrue)]
    disable: bool,
    /// Perform a single check, print the verdict and exit.
    #[arg(long, action = ArgAction::SetTrue)]
    once: bool,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[Syn-Syu-Watch] {}", err);
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = SynsyuConfig::load_from_optional_path(cli.config.as_deref())?;
    if let Some(version) = cli.running_version.clone() {
        config.checker.running_version = version;
    }
    if let Some(url) = cli.manifest_url.clone() {
        config.checker.manifest_url = url;
    }
    if cli.disable {
        config.checker.enabled = false;
    }
    config.checker.validate()?;

    let session_stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = cli
        .log
        .clone()
        .or_else(|| Some(config.log_dir().join(format!("watch_{session_stamp}.log"))));
    let logger = Arc::new(Logger::new(log_path, cli.verbose)?);
    logger.info("INIT", "Syn-Syu Watch awakening.");
    if let Some(path) = logger.path() {
        logger.debug("INIT", format!("Session log at {}", path.display()));
    }

    let metrics = Arc::new(FetchMetrics::new(METRIC_NAMESPACE));
    let checker = Arc::new(UpdateChecker::from_config(
        &config.checker,
        logger.clone(),
        metrics.clone(),
    )?);

    if checker.is_disabled() {
        logger.warn("DISABLED", "Update checks disabled; watch not started");
        return Ok(ExitCode::SUCCESS);
    }

    if cli.once {
        let outcome = checker.check_now().await;
        log_metrics(&logger, &metrics);
        let result = outcome?;
        print_summary(checker.running_version(), &result);
        return Ok(ExitCode::SUCCESS);
    }

    let mut shutdown = ShutdownSignal::install()?;
    let cancel = CancellationToken::new();
    let worker = tokio::spawn({
        let checker = checker.clone();
        let cancel = cancel.clone();
        async move { checker.run(cancel).await }
    });

    let signal = shutdown.wait().await?;
    logger.info("SIGNAL", format!("{signal} received; stopping update checker"));
    cancel.cancel();

    let outcome = worker
        .await
        .map_err(|err| SynsyuError::Runtime(format!("Update checker task failed: {err}")))?;
    log_metrics(&logger, &metrics);

    match outcome {
        Err(err) if err.is_cancellation() => {
            let last = checker.snapshot();
            logger.info(
                "COMPLETE",
                format!(
                    "latest={} update={}",
                    display_latest(&last.latest_version),
                    last.has_update
                ),
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Err(err),
        Ok(()) => Ok(ExitCode::SUCCESS),
    }
}

/// Process termination requests that stop the watch.
struct ShutdownSignal {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    fn install() -> Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let terminate = signal(SignalKind::terminate()).map_err(|err| {
                SynsyuError::Runtime(format!("Failed to install SIGTERM handler: {err}"))
            })?;
            Ok(Self { terminate })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Resolve with the name of the first signal delivered.
    async fn wait(&mut self) -> Result<&'static str> {
        #[cfg(unix)]
        {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    res.map_err(|err| SynsyuError::Runtime(format!("Failed to await Ctrl-C: {err}")))?;
                    Ok("SIGINT")
                }
                _ = self.terminate.recv() => Ok("SIGTERM"),
            }
        }
        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c()
                .await
                .map_err(|err| SynsyuError::Runtime(format!("Failed to await Ctrl-C: {err}")))?;
            Ok("SIGINT")
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SYNSYU_TRACE").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn log_metrics(logger: &Logger, metrics: &FetchMetrics) {
    for line in metrics.render().lines() {
        logger.debug("METRICS", line);
    }
}

fn display_latest(latest: &str) -> &str {
    if latest.is_empty() {
        "<unknown>"
    } else {
        latest
    }
}

fn print_summary(running: &str, result: &CheckResult) {
    let verdict = if result.has_update {
        "update available"
    } else {
        "up to date"
    };
    println!(
        "→ Syn-Syu {running}: {verdict} (latest={})",
        display_latest(&result.latest_version)
    );
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn sigterm_stops_the_watch() {
        let mut shutdown = ShutdownSignal::install().unwrap();
        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let signal = tokio::time::timeout(Duration::from_secs(2), shutdown.wait())
            .await
            .expect("SIGTERM delivered to the handler")
            .unwrap();
        assert_eq!(signal, "SIGTERM");
    }
}
