//! Utility functions for xtask commands

use anyhow::{Result, anyhow};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::dirs;

/// `session_<unix seconds>`
pub fn new_session_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("session_{}", timestamp)
}

/// Most recently written session under `root`.
pub fn find_latest_session(root: &Path) -> Result<String> {
    dirs::list_sessions(root)?
        .into_iter()
        .next()
        .map(|(id, _)| id)
        .ok_or_else(|| {
            anyhow!(
                "No session directories found in: {}\n\
                 Run `cargo xtask simulate <scenario> --save` first.",
                root.display()
            )
        })
}

/// Log to stderr and to `<log dir>/<session>/simulate.log`.
///
/// The returned guard flushes the file writer when dropped.
pub fn init_logging(session_id: &str) -> Result<WorkerGuard> {
    let session_log_dir = dirs::log_dir()?.join(session_id);
    std::fs::create_dir_all(&session_log_dir)?;

    let file_appender = tracing_appender::rolling::never(&session_log_dir, "simulate.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_file)
                .with_ansi(false),
        )
        .try_init()
        .map_err(|err| anyhow!("Failed to initialize logging: {err}"))?;

    tracing::info!(session = %session_id, "Logging initialized");
    tracing::info!("Log file: {}/simulate.log", session_log_dir.display());

    Ok(guard)
}

pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
