// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every problem is collected before failing so a single run reports all of
//! them.

use crate::{ConfigError, ConfigResult, FasConfig};

/// Longest accepted IPC name, leading slash included. Named semaphores are
/// stored as `sem.<name>` and must fit in NAME_MAX (255).
pub const MAX_IPC_NAME_LEN: usize = 251;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["json", "text"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    InvalidIpcName { field: String, name: String, reason: String },
    NameConflict { field1: String, field2: String, name: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIpcName { field, name, reason } => {
                write!(f, "{} = '{}' is not a valid IPC name: {}", field, name, reason)
            }
            Self::NameConflict { field1, field2, name } => {
                write!(f, "Name conflict: {} and {} both use '{}'", field1, field2, name)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &FasConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_ipc_names(config, &mut errors);
    validate_name_conflicts(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn ipc_name_problem(name: &str) -> Option<&'static str> {
    let Some(rest) = name.strip_prefix('/') else {
        return Some("must start with '/'");
    };
    if rest.is_empty() {
        return Some("must have at least one character after '/'");
    }
    if rest.contains('/') {
        return Some("must not contain '/' after the leading slash");
    }
    if rest.contains('\0') {
        return Some("must not contain NUL bytes");
    }
    if name.len() > MAX_IPC_NAME_LEN {
        return Some("is longer than 251 bytes");
    }
    None
}

fn validate_ipc_names(config: &FasConfig, errors: &mut Vec<ConfigValidationError>) {
    for (field, name) in config.ipc.all_names() {
        if let Some(reason) = ipc_name_problem(name) {
            errors.push(ConfigValidationError::InvalidIpcName {
                field: field.to_string(),
                name: name.to_string(),
                reason: reason.to_string(),
            });
        }
    }
}

fn validate_name_conflicts(config: &FasConfig, errors: &mut Vec<ConfigValidationError>) {
    let names = config.ipc.all_names();
    for (i, (field1, name1)) in names.iter().enumerate() {
        for (field2, name2) in &names[i + 1..] {
            if name1 == name2 {
                errors.push(ConfigValidationError::NameConflict {
                    field1: field1.to_string(),
                    field2: field2.to_string(),
                    name: name1.to_string(),
                });
            }
        }
    }
}

fn validate_logging(config: &FasConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let format = config.logging.format.trim().to_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.format".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        });
    }
}
