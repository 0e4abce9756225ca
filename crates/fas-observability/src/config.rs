// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging options handed to [`init_logging`](crate::init_logging)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Logging options for one process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingOptions {
    /// Level for crates without a debug flag (trace, debug, info, warn, error)
    pub level: String,

    /// Format of the optional log file; the console is always text
    pub file_format: LogFormat,

    /// Base directory for log files; `None` logs to the console only
    pub log_dir: Option<PathBuf>,

    /// Process role, used in the log file name (`supervisor`, `generator`)
    pub role: String,
}

impl LoggingOptions {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            level: "info".to_string(),
            file_format: LogFormat::Json,
            log_dir: None,
            role: role.into(),
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_log_dir(mut self, log_dir: Option<PathBuf>) -> Self {
        self.log_dir = log_dir;
        self
    }

    pub fn with_file_format(mut self, file_format: LogFormat) -> Self {
        self.file_format = file_format;
        self
    }
}

/// Log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One human-readable line per event
    Text,
    /// One JSON object per event, with target, file and line
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    /// Case-insensitive `text` or `json`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("unknown log format '{}', expected text or json", s)),
        }
    }
}
