//! Logging setup.
//!
//! Console output always; daily rolling files when a log directory is
//! configured. `RUST_LOG` takes precedence over the configured level.
//!
//! ```no_run
//! use sweeper::config::LogSettings;
//!
//! sweeper::logging::init(&LogSettings::default())?;
//! tracing::info!("ready");
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::config::LogSettings;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const LOG_FILE_PREFIX: &str = "sweeper";
const MAX_LOG_FILES: usize = 10;

/// Default directory for file logs, under the platform data directory.
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("sweeper").join("logs"))
}

/// Filter from `RUST_LOG`, falling back to `level`.
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level '{level}'"))
}

fn file_appender(dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(dir)
        .context("Failed to create log file appender")
}

/// Install the global subscriber. Call once at startup.
///
/// # Errors
///
/// Fails on an invalid level, an unusable log directory or when a global
/// subscriber is already set.
pub fn init(settings: &LogSettings) -> Result<()> {
    let filter = build_filter(&settings.level)?;

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = settings
        .directory
        .as_deref()
        .map(file_appender)
        .transpose()?
        .map(|appender| {
            fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(appender)
                .boxed()
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(dir) = &settings.directory {
        tracing::debug!("Logging to {}", current_log_path(dir).display());
    }
    Ok(())
}

/// Path of today's log file in `dir`.
pub fn current_log_path(dir: &Path) -> PathBuf {
    let today = chrono::Local::now().format("%Y-%m-%d");
    dir.join(format!("{LOG_FILE_PREFIX}.{today}.log"))
}
