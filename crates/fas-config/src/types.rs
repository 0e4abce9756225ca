// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions mapping to the sections of `fas.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FasConfig {
    pub ipc: IpcConfig,
    pub logging: LoggingConfig,
    pub generator: GeneratorConfig,
}

/// Names of the shared memory object and the three semaphores.
///
/// Supervisor and generators must agree on all four.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct IpcConfig {
    pub shm_name: String,
    pub sem_free_name: String,
    pub sem_used_name: String,
    pub sem_mutex_name: String,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            shm_name: "/fb_arc_set_shm".to_string(),
            sem_free_name: "/fb_arc_set_free".to_string(),
            sem_used_name: "/fb_arc_set_used".to_string(),
            sem_mutex_name: "/fb_arc_set_mutex".to_string(),
        }
    }
}

impl IpcConfig {
    /// `(field, value)` pairs for every IPC name, in acquisition order.
    pub fn all_names(&self) -> [(&'static str, &str); 4] {
        [
            ("ipc.shm_name", self.shm_name.as_str()),
            ("ipc.sem_free_name", self.sem_free_name.as_str()),
            ("ipc.sem_used_name", self.sem_used_name.as_str()),
            ("ipc.sem_mutex_name", self.sem_mutex_name.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for every crate not raised by a debug flag
    pub level: String,
    /// When set, each process also writes a log file under this directory
    pub log_dir: Option<PathBuf>,
    /// Log file format: `json` or `text`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            format: "json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Fixed seed for reproducible runs; otherwise seeded per process
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: FasConfig = toml::from_str(
            r#"
            [ipc]
            shm_name = "/custom_shm"

            [generator]
            seed = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.ipc.shm_name, "/custom_shm");
        assert_eq!(config.ipc.sem_free_name, "/fb_arc_set_free");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.generator.seed, Some(12));
    }

    #[test]
    fn test_all_names_order() {
        let ipc = IpcConfig::default();
        let fields: Vec<_> = ipc.all_names().iter().map(|(field, _)| *field).collect();
        assert_eq!(
            fields,
            vec![
                "ipc.shm_name",
                "ipc.sem_free_name",
                "ipc.sem_used_name",
                "ipc.sem_mutex_name"
            ]
        );
    }
}
