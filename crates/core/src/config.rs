use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

pub const DEFAULT_HOME_DIR: &str = ".defscope";
pub const DEFAULT_INDEX_DIR: &str = "indices";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const PROJECT_CONFIG_FILE: &str = ".defscope.json";
pub const INDEX_DIR_ENV: &str = "DEFSCOPE_INDEX_DIR";
pub const LOG_DIR_ENV: &str = "DEFSCOPE_LOG_DIR";

/// Tunables for one indexing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// Capacity of the bounded queue between extraction workers and the store.
    pub channel_capacity: usize,
    /// Resolve references that originate in `_test.go` files.
    pub include_tests: bool,
    /// Overrides the snapshot directory (otherwise env var or home default).
    pub index_dir: Option<PathBuf>,
    /// Overrides the log directory (otherwise env var or home default).
    pub log_dir: Option<PathBuf>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            include_tests: false,
            index_dir: None,
            log_dir: None,
        }
    }
}

impl IndexConfig {
    /// Reads `.defscope.json` from the project root, falling back to defaults
    /// when the file does not exist.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(PROJECT_CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        let config: IndexConfig = serde_json::from_str(&raw)?;
        tracing::debug!("Loaded project config from {}", path.display());
        Ok(config)
    }

    /// Directory holding snapshots for every indexed project.
    pub fn base_index_dir(&self) -> PathBuf {
        if let Some(dir) = &self.index_dir {
            return dir.clone();
        }
        base_index_dir()
    }

    /// Directory for rolling log files.
    pub fn log_dir(&self) -> PathBuf {
        if let Some(dir) = &self.log_dir {
            return dir.clone();
        }
        if let Ok(env_dir) = std::env::var(LOG_DIR_ENV) {
            return PathBuf::from(env_dir);
        }
        defscope_home().join(DEFAULT_LOG_DIR)
    }

    /// Snapshot file for `project_root`, keyed by a hash of its canonical path.
    pub fn index_path(&self, project_root: &Path) -> PathBuf {
        let abs_path = project_root
            .canonicalize()
            .unwrap_or_else(|_| project_root.to_path_buf());
        let hash = xxh3_64(abs_path.to_string_lossy().as_bytes());
        self.base_index_dir().join(format!("{:016x}.bin", hash))
    }
}

/// `~/.defscope`, or `./.defscope` when no home directory is known.
pub fn defscope_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_HOME_DIR)
}

/// Gets the base directory for storing indices, supporting the DEFSCOPE_INDEX_DIR env var.
pub fn base_index_dir() -> PathBuf {
    if let Ok(env_dir) = std::env::var(INDEX_DIR_ENV) {
        return PathBuf::from(env_dir);
    }
    defscope_home().join(DEFAULT_INDEX_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_project_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = IndexConfig::load(dir.path()).unwrap();
        assert_eq!(config, IndexConfig::default());
    }

    #[test]
    fn test_partial_project_config_is_defaulted() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            r#"{ "include_tests": true }"#,
        )
        .unwrap();
        let config = IndexConfig::load(dir.path()).unwrap();
        assert!(config.include_tests);
        assert_eq!(config.channel_capacity, 256);
    }

    #[test]
    fn test_unknown_config_field_is_rejected() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_CONFIG_FILE), r#"{ "colour": 1 }"#).unwrap();
        assert!(IndexConfig::load(dir.path()).is_err());
    }

    #[test]
    fn test_project_config_overrides_log_dir() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            r#"{ "log_dir": "/tmp/defscope-logs" }"#,
        )
        .unwrap();
        let config = IndexConfig::load(dir.path()).unwrap();
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/defscope-logs"));
        assert_eq!(config.index_dir, None);
    }

    #[test]
    fn test_index_path_is_stable_per_project() {
        let dir = tempdir().unwrap();
        let config = IndexConfig {
            index_dir: Some(PathBuf::from("/tmp/defscope-test")),
            ..IndexConfig::default()
        };
        let a = config.index_path(dir.path());
        let b = config.index_path(dir.path());
        assert_eq!(a, b);
        assert!(a.starts_with("/tmp/defscope-test"));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("bin"));
    }
}
