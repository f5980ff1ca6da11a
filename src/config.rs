use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sort::SortRule;

/// Overrides the data directory.
pub const DATA_DIR_ENV: &str = "CADENCE_DATA_DIR";
/// `tracing` filter directive, takes precedence over `log_filter`.
pub const LOG_ENV: &str = "CADENCE_LOG";

const CONFIG_FILE: &str = "config.json";

/// Returns the directory holding tasks, templates and `config.json`.
///
/// The path is determined in the following order:
/// 1. `CADENCE_DATA_DIR` environment variable.
/// 2. `~/.local/share/cadence` (on Linux).
/// 3. `./.cadence` (fallback).
pub fn data_dir() -> PathBuf {
    std::env::var(DATA_DIR_ENV).map(PathBuf::from).unwrap_or_else(|_| {
        dirs::data_local_dir()
            .map(|p| p.join("cadence"))
            .unwrap_or_else(|| PathBuf::from(".cadence"))
    })
}

fn default_sort_rules() -> Vec<SortRule> {
    vec![SortRule::DUE_DATE_ASC]
}

fn default_true() -> bool {
    true
}

fn default_log_filter() -> String {
    "warn".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// List ordering. A leading `due_date:asc` selects the smart ordering.
    #[serde(default = "default_sort_rules")]
    pub sort_rules: Vec<SortRule>,
    /// Run the materializer before `list` and `ui`.
    #[serde(default = "default_true")]
    pub materialize_on_startup: bool,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sort_rules: default_sort_rules(),
            materialize_on_startup: true,
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Loads `config.json` from `dir`; a missing file yields the defaults.
    pub fn load(dir: &Path) -> Result<Config> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        let s = fs::read_to_string(&path)?;
        serde_json::from_str(&s).map_err(|source| Error::Parse { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::{SortDirection, SortField};

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"sort_rules": [{"field": "priority", "direction": "desc"}]}"#,
        )
        .unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(
            cfg.sort_rules,
            vec![SortRule { field: SortField::Priority, direction: SortDirection::Desc }]
        );
        assert!(cfg.materialize_on_startup);
        assert_eq!(cfg.log_filter, "warn");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{ nope").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::Parse { .. })));
    }
}
