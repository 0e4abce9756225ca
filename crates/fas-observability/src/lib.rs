// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # fas-observability
//!
//! Logging for the supervisor and generator processes.
//!
//! Console output goes to stderr so stdout stays free for the supervisor's
//! solution report. Individual crates can be raised to `debug` with
//! `--debug <crate>` or `FAS_DEBUG`.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "fas",
    "fas-config",
    "fas-graph",
    "fas-shm",
    "fas-pipeline",
];
