// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Tiers, lowest precedence first:
//! 1. TOML file (or built-in defaults when none is found)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, FasConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "fas.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "FAS_CONFIG_PATH";

/// Find the configuration file
///
/// Search order:
/// 1. `FAS_CONFIG_PATH` environment variable
/// 2. Current working directory: `./fas.toml`
/// 3. Up to 5 parent directories
///
/// Returns `Ok(None)` when nothing is found in the search locations.
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if `FAS_CONFIG_PATH` names a missing file
pub fn find_config_file() -> ConfigResult<Option<PathBuf>> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::FileNotFound(format!(
            "file specified by {} does not exist: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let Ok(cwd) = env::current_dir() else {
        return Ok(None);
    };

    let found = cwd
        .ancestors()
        .take(6)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.exists());
    Ok(found)
}

/// Load configuration
///
/// # Arguments
///
/// * `config_path` - Explicit config file. If `None`, the file is searched for
///   and defaults are used when none exists.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if an explicit file is missing, the TOML is invalid, or an
/// override value cannot be parsed
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<FasConfig> {
    let config_file = match config_path {
        Some(path) if !path.exists() => {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file()?,
    };

    let mut config = match config_file {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        }
        None => FasConfig::default(),
    };

    apply_environment_overrides(&mut config)?;

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `FAS_SHM_NAME` -> `ipc.shm_name`
/// - `FAS_SEM_FREE_NAME` -> `ipc.sem_free_name`
/// - `FAS_SEM_USED_NAME` -> `ipc.sem_used_name`
/// - `FAS_SEM_MUTEX_NAME` -> `ipc.sem_mutex_name`
/// - `FAS_LOG_LEVEL` -> `logging.level`
/// - `FAS_LOG_DIR` -> `logging.log_dir`
/// - `FAS_LOG_FORMAT` -> `logging.format`
/// - `FAS_GENERATOR_SEED` -> `generator.seed`
pub fn apply_environment_overrides(config: &mut FasConfig) -> ConfigResult<()> {
    let overrides: HashMap<String, String> = [
        ("FAS_SHM_NAME", "shm_name"),
        ("FAS_SEM_FREE_NAME", "sem_free_name"),
        ("FAS_SEM_USED_NAME", "sem_used_name"),
        ("FAS_SEM_MUTEX_NAME", "sem_mutex_name"),
        ("FAS_LOG_LEVEL", "log_level"),
        ("FAS_LOG_DIR", "log_dir"),
        ("FAS_LOG_FORMAT", "log_format"),
        ("FAS_GENERATOR_SEED", "seed"),
    ]
    .into_iter()
    .filter_map(|(var, key)| env::var(var).ok().map(|value| (key.to_string(), value)))
    .collect();

    apply_cli_overrides(config, &overrides)
}

/// Apply CLI argument overrides to configuration
///
/// Unknown keys are ignored.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if `seed` is not an unsigned integer
pub fn apply_cli_overrides(
    config: &mut FasConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    for (key, value) in cli_args {
        match key.as_str() {
            "shm_name" => config.ipc.shm_name = value.clone(),
            "sem_free_name" => config.ipc.sem_free_name = value.clone(),
            "sem_used_name" => config.ipc.sem_used_name = value.clone(),
            "sem_mutex_name" => config.ipc.sem_mutex_name = value.clone(),
            "log_level" => config.logging.level = value.clone(),
            "log_dir" => config.logging.log_dir = Some(PathBuf::from(value)),
            "log_format" => config.logging.format = value.clone(),
            "seed" => {
                let seed = value.parse::<u64>().map_err(|_| {
                    ConfigError::InvalidValue(format!(
                        "generator.seed must be an unsigned integer, got '{}'",
                        value
                    ))
                })?;
                config.generator.seed = Some(seed);
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 9] = [
        CONFIG_PATH_ENV,
        "FAS_SHM_NAME",
        "FAS_SEM_FREE_NAME",
        "FAS_SEM_USED_NAME",
        "FAS_SEM_MUTEX_NAME",
        "FAS_LOG_LEVEL",
        "FAS_LOG_DIR",
        "FAS_LOG_FORMAT",
        "FAS_GENERATOR_SEED",
    ];

    /// Clears the FAS_* variables for the duration of a test and restores them after.
    struct EnvSnapshot(Vec<(&'static str, Option<String>)>);

    impl EnvSnapshot {
        fn clear() -> Self {
            let saved = ENV_VARS.iter().map(|var| (*var, env::var(var).ok())).collect();
            for var in ENV_VARS {
                env::remove_var(var);
            }
            Self(saved)
        }
    }

    impl Drop for EnvSnapshot {
        fn drop(&mut self) {
            for (var, value) in &self.0 {
                match value {
                    Some(value) => env::set_var(var, value),
                    None => env::remove_var(var),
                }
            }
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let _env = EnvSnapshot::clear();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();

        assert_eq!(result.unwrap(), Some(config_path));
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let _env = EnvSnapshot::clear();
        let dir = tempdir().unwrap();

        env::set_var(CONFIG_PATH_ENV, dir.path().join("absent.toml"));
        let result = find_config_file();

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_file_then_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let _env = EnvSnapshot::clear();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[ipc]").unwrap();
        writeln!(file, "shm_name = \"/from_file\"").unwrap();
        writeln!(file, "sem_used_name = \"/used_from_file\"").unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "level = \"warn\"").unwrap();

        env::set_var("FAS_SHM_NAME", "/from_env");
        env::set_var("FAS_LOG_LEVEL", "debug");

        let mut cli = HashMap::new();
        cli.insert("log_level".to_string(), "trace".to_string());
        cli.insert("seed".to_string(), "7".to_string());

        let config = load_config(Some(&config_path), Some(&cli)).unwrap();

        assert_eq!(config.ipc.shm_name, "/from_env");
        assert_eq!(config.ipc.sem_used_name, "/used_from_file");
        assert_eq!(config.ipc.sem_free_name, "/fb_arc_set_free");
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.generator.seed, Some(7));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let _env = EnvSnapshot::clear();
        let dir = tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("nope.toml")), None);
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let _env = EnvSnapshot::clear();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[ipc\nshm_name = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let _env = EnvSnapshot::clear();
        let mut config = FasConfig::default();

        env::set_var("FAS_SEM_MUTEX_NAME", "/mutex_env");
        env::set_var("FAS_LOG_DIR", "/tmp/fas-logs");
        env::set_var("FAS_LOG_FORMAT", "text");
        env::set_var("FAS_GENERATOR_SEED", "123");

        apply_environment_overrides(&mut config).unwrap();

        assert_eq!(config.ipc.sem_mutex_name, "/mutex_env");
        assert_eq!(config.logging.log_dir, Some(PathBuf::from("/tmp/fas-logs")));
        assert_eq!(config.logging.format, "text");
        assert_eq!(config.generator.seed, Some(123));
    }

    #[test]
    fn test_invalid_seed_rejected() {
        let mut config = FasConfig::default();
        let mut cli = HashMap::new();
        cli.insert("seed".to_string(), "-4".to_string());

        let result = apply_cli_overrides(&mut config, &cli);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
        assert_eq!(config.generator.seed, None);
    }
}
