// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output (stderr, human-readable) is always installed. When a log
//! directory is configured, each process also writes its own file:
//! ```text
//! <log_dir>/
//!   └── run_20250101_120000/
//!       ├── supervisor-4121.log
//!       └── generator-4133.log
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingOptions};

/// Keeps the non-blocking file writer alive; logs are flushed on drop
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    log_file: Option<PathBuf>,
}

impl LoggingGuard {
    /// Path of this process's log file, if file logging is enabled
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// Build the filter for one process from its level and debug flags
pub fn build_filter(debug_flags: &CrateDebugFlags, level: &str) -> Result<EnvFilter> {
    let filter = debug_flags.to_filter_string(level);
    EnvFilter::try_new(&filter).with_context(|| format!("Invalid log filter '{}'", filter))
}

/// Path of the log file for `role` under `log_dir`
pub fn log_file_path(log_dir: &Path, role: &str) -> PathBuf {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    log_dir
        .join(format!("run_{}", timestamp))
        .join(format!("{}-{}.log", role, std::process::id()))
}

/// File layer writing `format` to `writer`. Never colored.
pub fn file_layer<W>(
    format: LogFormat,
    writer: W,
    filter: EnvFilter,
) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);
    match format {
        LogFormat::Json => layer
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(filter)
            .boxed(),
        LogFormat::Text => layer.with_filter(filter).boxed(),
    }
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails if the filter is invalid, the log directory cannot be created, or a
/// global subscriber is already installed
pub fn init_logging(debug_flags: &CrateDebugFlags, options: &LoggingOptions) -> Result<LoggingGuard> {
    let env_filter = build_filter(debug_flags, &options.level)?;

    let mut layers = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(env_filter)
        .boxed();
    layers.push(console_layer);

    let mut file_guard = None;
    let mut log_file = None;

    if let Some(base_dir) = &options.log_dir {
        let path = log_file_path(base_dir, &options.role);
        let (run_folder, file_name) = match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => (parent.to_path_buf(), name.to_owned()),
            _ => anyhow::bail!("Invalid log file path: {}", path.display()),
        };
        std::fs::create_dir_all(&run_folder)
            .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

        let (non_blocking, guard) =
            tracing_appender::non_blocking(rolling::never(&run_folder, file_name));
        file_guard = Some(guard);

        let file_filter = build_filter(debug_flags, &options.level)?;
        layers.push(file_layer(options.file_format, non_blocking, file_filter));
        log_file = Some(path);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_file,
    })
}
