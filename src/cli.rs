// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Command-line plumbing shared by `fas-supervisor` and `fas-generator`

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use fas_config::{load_config, validate_config, FasConfig, IpcConfig};
use fas_observability::{
    init_logging, parse_debug_flags, LogFormat, LoggingGuard, LoggingOptions,
};
use fas_shm::ResourceNames;
use tracing::info;

/// Options understood by both processes
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Configuration file (default: search for fas.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Name of the shared memory segment
    #[arg(long, value_name = "NAME")]
    pub shm_name: Option<String>,

    /// Name of the `free` semaphore
    #[arg(long, value_name = "NAME")]
    pub sem_free_name: Option<String>,

    /// Name of the `used` semaphore
    #[arg(long, value_name = "NAME")]
    pub sem_used_name: Option<String>,

    /// Name of the `mutualExclusion` semaphore
    #[arg(long, value_name = "NAME")]
    pub sem_mutex_name: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Also write logs under this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Format of the log file (json, text)
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<String>,

    /// Enable debug logging for a crate, or `all` (repeatable)
    #[arg(long = "debug", value_name = "CRATE")]
    pub debug: Vec<String>,
}

impl CommonArgs {
    /// CLI values in the form `apply_cli_overrides` expects
    pub fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        let pairs = [
            ("shm_name", self.shm_name.clone()),
            ("sem_free_name", self.sem_free_name.clone()),
            ("sem_used_name", self.sem_used_name.clone()),
            ("sem_mutex_name", self.sem_mutex_name.clone()),
            ("log_level", self.log_level.clone()),
            (
                "log_dir",
                self.log_dir.as_ref().map(|dir| dir.display().to_string()),
            ),
            ("log_format", self.log_format.clone()),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                overrides.insert(key.to_string(), value);
            }
        }
        overrides
    }

    /// Load and validate the configuration, `extra` overriding everything else
    pub fn load_config(&self, extra: &[(&str, String)]) -> Result<FasConfig> {
        let mut overrides = self.overrides();
        for (key, value) in extra {
            overrides.insert((*key).to_string(), value.clone());
        }

        let config = load_config(self.config.as_deref(), Some(&overrides))
            .context("Failed to load configuration")?;
        validate_config(&config).context("Invalid configuration")?;
        Ok(config)
    }

    /// Install logging for `role`; keep the guard alive until exit
    pub fn init_logging(&self, config: &FasConfig, role: &str) -> Result<LoggingGuard> {
        let debug_flags = parse_debug_flags(&self.debug);
        let options = logging_options(config, role)?;
        let guard = init_logging(&debug_flags, &options).context("Failed to initialize logging")?;
        if debug_flags.any_enabled() {
            let crates: Vec<&str> = debug_flags.enabled_crates().collect();
            info!(crates = %crates.join(","), "Debug logging enabled");
        }
        Ok(guard)
    }
}

/// Logging options for `role` from the `[logging]` section
pub fn logging_options(config: &FasConfig, role: &str) -> Result<LoggingOptions> {
    let format: LogFormat = config
        .logging
        .format
        .parse()
        .map_err(anyhow::Error::msg)
        .context("Invalid logging.format")?;
    Ok(LoggingOptions::new(role)
        .with_level(config.logging.level.clone())
        .with_log_dir(config.logging.log_dir.clone())
        .with_file_format(format))
}

/// Resource names taken from the `[ipc]` section
pub fn resource_names(ipc: &IpcConfig) -> ResourceNames {
    ResourceNames::new(
        ipc.shm_name.as_str(),
        ipc.sem_free_name.as_str(),
        ipc.sem_used_name.as_str(),
        ipc.sem_mutex_name.as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_only_contain_given_values() {
        let args = CommonArgs {
            shm_name: Some("/x_shm".to_string()),
            log_dir: Some(PathBuf::from("/tmp/fas-logs")),
            ..Default::default()
        };
        let overrides = args.overrides();
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides["shm_name"], "/x_shm");
        assert_eq!(overrides["log_dir"], "/tmp/fas-logs");
    }

    #[test]
    fn test_log_format_reaches_logging_options() {
        let mut config = FasConfig::default();
        let options = logging_options(&config, "supervisor").unwrap();
        assert_eq!(options.file_format, LogFormat::Json);

        let args = CommonArgs {
            log_format: Some("text".to_string()),
            ..Default::default()
        };
        fas_config::apply_cli_overrides(&mut config, &args.overrides()).unwrap();
        let options = logging_options(&config, "generator").unwrap();
        assert_eq!(options.file_format, LogFormat::Text);
        assert_eq!(options.role, "generator");

        config.logging.format = "yaml".to_string();
        assert!(logging_options(&config, "generator").is_err());
    }

    #[test]
    fn test_resource_names_follow_ipc_section() {
        let ipc = IpcConfig::default();
        assert_eq!(resource_names(&ipc), ResourceNames::default());
    }
}
