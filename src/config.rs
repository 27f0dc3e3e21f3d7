use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::storage::SqliteOptions;

/// Database name that selects an in-memory SQLite database
pub const MEMORY_DSN: &str = ":memory:";

/// Contents of `assetdb.toml`. Unknown keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AssetDbConfig {
    /// Database file path, or `:memory:`
    pub database: Option<String>,
    pub busy_timeout_ms: Option<u64>,
}

impl AssetDbConfig {
    pub fn is_in_memory(&self) -> bool {
        self.database.as_deref() == Some(MEMORY_DSN)
    }

    pub fn database_path(&self) -> String {
        self.database
            .clone()
            .unwrap_or_else(|| default_database_path_in(Path::new(".")).display().to_string())
    }

    /// Overlay values given on the command line
    pub fn with_database(mut self, database: Option<String>) -> Self {
        if database.is_some() {
            self.database = database;
        }
        self
    }
}

impl From<&AssetDbConfig> for SqliteOptions {
    fn from(config: &AssetDbConfig) -> Self {
        let defaults = SqliteOptions::default();
        Self {
            busy_timeout: config
                .busy_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.busy_timeout),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("assetdb.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".assetdb").join("assetdb.db")
}

/// Read `assetdb.toml` (or `path`); a missing file is not an error
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<AssetDbConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };

    let config = toml::from_str(&contents).with_context(|| format!("invalid config in {}", path.display()))?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &AssetDbConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    std::fs::write(path, toml::to_string_pretty(config)?)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Create the directory holding a database file. In-memory databases need none.
pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if db_path.as_os_str() == MEMORY_DSN {
        return Ok(());
    }
    match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("assetdb.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assetdb.toml");
        let config = AssetDbConfig {
            database: Some("assets.db".into()),
            busy_timeout_ms: Some(250),
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded, config);

        let options = SqliteOptions::from(&loaded);
        assert_eq!(options.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_legacy_foreign_keys_key_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assetdb.toml");
        std::fs::write(&path, "database = \":memory:\"\nforeign_keys = false\n").unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert!(loaded.is_in_memory());
        assert_eq!(loaded.busy_timeout_ms, None);
    }

    #[test]
    fn test_invalid_config_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assetdb.toml");
        std::fs::write(&path, "busy_timeout_ms = \"soon\"\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("assetdb.toml"));
    }

    #[test]
    fn test_database_override() {
        let config = AssetDbConfig::default();
        assert!(config.database_path().ends_with("assetdb.db"));

        let config = config.with_database(Some(MEMORY_DSN.into()));
        assert_eq!(config.database_path(), MEMORY_DSN);
        assert_eq!(config.clone().with_database(None), config);
    }

    #[test]
    fn test_ensure_db_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = default_database_path_in(dir.path());
        ensure_db_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
        ensure_db_dir(Path::new(MEMORY_DSN)).unwrap();
    }
}
