use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::Scope;

pub(crate) const CONFIG_FILE: &str = "config.json";
pub(crate) const DB_FILE: &str = "cashbook.db";
/// Environment variable that overrides the database location.
pub(crate) const DB_ENV: &str = "CASHBOOK_DB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    pub default_scope: String,
    pub months_to_create: u32,
    pub replication_window_months: u32,
    pub subscription_months: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            default_scope: Scope::Personal.as_str().into(),
            months_to_create: 12,
            replication_window_months: 12,
            subscription_months: 12,
        }
    }
}

impl Config {
    /// Read `path`; a missing file yields the defaults.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.scope()?;
        Ok(config)
    }

    pub(crate) fn scope(&self) -> Result<Scope> {
        Scope::parse(&self.default_scope)
            .ok_or_else(|| anyhow::anyhow!("Unknown default_scope: {}", self.default_scope))
    }

    /// Database location: `env_override`, then `database_path`, then the data dir.
    pub(crate) fn database_path(&self, data_dir: &Path, env_override: Option<PathBuf>) -> PathBuf {
        env_override
            .or_else(|| self.database_path.clone())
            .unwrap_or_else(|| data_dir.join(DB_FILE))
    }
}

/// Platform data directory, created on first use.
pub(crate) fn data_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "cashbook", "Cashbook")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.months_to_create, 12);
        assert_eq!(config.scope().unwrap(), Scope::Personal);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "default_scope": "empresa", "months_to_create": 6 }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.scope().unwrap(), Scope::Company);
        assert_eq!(config.months_to_create, 6);
        assert_eq!(config.replication_window_months, 12);
    }

    #[test]
    fn test_unknown_scope_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "default_scope": "household" }"#).unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_database_path_precedence() {
        let data = Path::new("/data");
        let mut config = Config::default();
        assert_eq!(config.database_path(data, None), data.join(DB_FILE));

        config.database_path = Some(PathBuf::from("/custom/books.db"));
        assert_eq!(
            config.database_path(data, None),
            PathBuf::from("/custom/books.db")
        );
        assert_eq!(
            config.database_path(data, Some(PathBuf::from("/env.db"))),
            PathBuf::from("/env.db")
        );
    }
}
