use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::NexusConfig;

/// Crates that log at `debug` regardless of the base level.
const WORKSPACE_CRATES: [&str; 2] = ["nexus_core", "nexus_wallet"];

/// Log file prefix; tracing-appender appends the date.
const LOG_FILE_PREFIX: &str = "nexus";

/// Filter used when `RUST_LOG` is unset: `level` for everything, `debug` for
/// the workspace crates.
pub fn fallback_filter(level: &str) -> String {
    let mut directives = vec![level.trim().to_string()];
    directives.extend(WORKSPACE_CRATES.iter().map(|c| format!("{c}=debug")));
    directives.join(",")
}

/// Console plus daily-rotated file output under `~/.nexus/logs`, at the
/// `log_level` from config. Keep the returned guard alive for the lifetime
/// of the process or buffered lines are lost.
pub fn init_logging(config: &NexusConfig) -> Result<WorkerGuard> {
    let logs_dir = NexusConfig::logs_dir()?;
    let (writer, guard) = file_writer(&logs_dir)?;
    install(env_filter(&fallback_filter(&config.log_level)), writer, true)?;
    Ok(guard)
}

/// File-only output into `logs_dir` with an explicit fallback `filter`.
/// Returns an error instead of panicking when a subscriber is already set.
pub fn init_logging_to_dir(logs_dir: &Path, filter: &str) -> Result<WorkerGuard> {
    let (writer, guard) = file_writer(logs_dir)?;
    install(env_filter(filter), writer, false)?;
    Ok(guard)
}

fn file_writer(logs_dir: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;
    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

fn install(filter: EnvFilter, writer: NonBlocking, console: bool) -> Result<()> {
    let file_layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer);
    let console_layer = console.then(|| fmt::layer().with_target(false).compact());

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}
