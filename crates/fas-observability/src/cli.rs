// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-crate debug flags
//!
//! Crates are named the way Cargo spells them (`fas-shm`). Filters are
//! emitted with the tracing target spelling (`fas_shm`).

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable listing crates to debug (`all` or comma-separated)
pub const DEBUG_ENV: &str = "FAS_DEBUG";

/// Set of crates whose logging is raised to `debug`
///
/// # Example
/// ```rust
/// use fas_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_names(["fas-shm"]);
/// assert!(flags.is_enabled("fas-shm"));
/// assert_eq!(flags.to_filter_string("info"), "fas_shm=debug,info");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Build flags from crate names. `all` enables every known crate.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = Self::default();
        for name in names {
            flags.enable(name.as_ref());
        }
        flags
    }

    /// Parse a `FAS_DEBUG` style value: `all` or comma-separated crate names
    pub fn from_env_value(value: &str) -> Self {
        Self::from_names(value.split(','))
    }

    /// Enable one crate, or every known crate for `all`. Blank names are ignored.
    pub fn enable(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if name == "all" {
            self.enabled_crates
                .extend(KNOWN_CRATES.iter().map(|c| c.to_string()));
        } else {
            self.enabled_crates.insert(name.to_string());
        }
    }

    /// Union of both flag sets
    pub fn merge(&mut self, other: CrateDebugFlags) {
        self.enabled_crates.extend(other.enabled_crates);
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn enabled_crates(&self) -> impl Iterator<Item = &str> {
        self.enabled_crates.iter().map(String::as_str)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `EnvFilter` directive string: one `<target>=debug` per enabled crate
    /// followed by `default_level` for everything else.
    pub fn to_filter_string(&self, default_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|name| format!("{}=debug", name.replace('-', "_")))
            .collect();
        filters.push(default_level.to_lowercase());
        filters.join(",")
    }
}

/// Combine CLI debug names with the `FAS_DEBUG` environment variable
pub fn parse_debug_flags<S: AsRef<str>>(cli_names: &[S]) -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_names(cli_names);
    if let Ok(value) = env::var(DEBUG_ENV) {
        flags.merge(CrateDebugFlags::from_env_value(&value));
    }
    flags
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug all                    Enable debug logging for all crates
  --debug {{crate-name}}           Enable debug logging for specific crate (repeatable)

Available crates:
  {}

Environment Variable:
  {}={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  {}=all                             Enable debug for all crates
"#,
        KNOWN_CRATES.join(", "),
        DEBUG_ENV,
        DEBUG_ENV
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_names(["fas-shm"]);
        assert!(flags.is_enabled("fas-shm"));
        assert!(!flags.is_enabled("fas-graph"));
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_names(["all"]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_env_value_parsing() {
        let flags = CrateDebugFlags::from_env_value(" fas-graph, ,fas-pipeline ");
        assert_eq!(
            flags.enabled_crates().collect::<Vec<_>>(),
            vec!["fas-graph", "fas-pipeline"]
        );
    }

    #[test]
    fn test_filter_string_uses_target_spelling() {
        let flags = CrateDebugFlags::from_names(["fas-shm", "fas-graph"]);
        assert_eq!(
            flags.to_filter_string("WARN"),
            "fas_graph=debug,fas_shm=debug,warn"
        );
        assert_eq!(CrateDebugFlags::default().to_filter_string("info"), "info");
    }

    #[test]
    fn test_merge() {
        let mut flags = CrateDebugFlags::from_names(["fas-shm"]);
        flags.merge(CrateDebugFlags::from_names(["fas-config"]));
        assert!(flags.is_enabled("fas-shm"));
        assert!(flags.is_enabled("fas-config"));
        assert!(flags.any_enabled());
        assert!(!CrateDebugFlags::from_env_value(" , ").any_enabled());
    }
}
