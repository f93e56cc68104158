//! Configuration loading for docsync.
//!
//! Layered config: defaults -> config file -> explicit file -> env vars.
//! The default config file lives at `~/.config/docsync/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::TypesError;

/// Main settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the RocksDB record store directory
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Root directory holding one sub-directory per search index
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// Memory budget for each index writer, in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Page size when walking index ids during maintenance
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum number of document ids removed per delete call
    #[serde(default = "default_delete_batch_size")]
    pub delete_batch_size: usize,
}

fn data_dir(leaf: &str) -> String {
    ProjectDirs::from("", "", "docsync")
        .map(|p| p.data_local_dir().join(leaf))
        .unwrap_or_else(|| PathBuf::from(".").join(leaf))
        .to_string_lossy()
        .to_string()
}

fn default_db_path() -> String {
    data_dir("db")
}

fn default_index_path() -> String {
    data_dir("search-index")
}

fn default_writer_memory_mb() -> usize {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_batch_size() -> usize {
    500
}

fn default_delete_batch_size() -> usize {
    200
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            index_path: default_index_path(),
            writer_memory_mb: default_writer_memory_mb(),
            log_level: default_log_level(),
            batch_size: default_batch_size(),
            delete_batch_size: default_delete_batch_size(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/docsync/config.toml)
    /// 3. Explicit config file (optional)
    /// 4. Environment variables (DOCSYNC_*)
    pub fn load(config_path: Option<&str>) -> Result<Self, TypesError> {
        let config_dir = ProjectDirs::from("", "", "docsync")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("index_path", default_index_path())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("writer_memory_mb", default_writer_memory_mb() as i64)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("batch_size", default_batch_size() as i64)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("delete_batch_size", default_delete_batch_size() as i64)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // DOCSYNC_DB_PATH, DOCSYNC_INDEX_PATH, ...
        builder = builder.add_source(
            Environment::with_prefix("DOCSYNC")
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| TypesError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| TypesError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make the store or index unusable.
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.writer_memory_mb == 0 {
            return Err(TypesError::Config("writer_memory_mb must be > 0".into()));
        }
        if self.batch_size == 0 || self.delete_batch_size == 0 {
            return Err(TypesError::Config("batch sizes must be > 0".into()));
        }
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.db_path)
    }

    pub fn index_path(&self) -> PathBuf {
        PathBuf::from(&self.index_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.writer_memory_mb, 50);
        assert_eq!(settings.batch_size, 500);
        assert_eq!(settings.delete_batch_size, 200);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.delete_batch_size, 200);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("docsync.toml");
        std::fs::write(&path, "batch_size = 25\nlog_level = \"debug\"\n").unwrap();

        let settings = Settings::load(Some(&path.to_string_lossy())).unwrap();
        assert_eq!(settings.batch_size, 25);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let settings = Settings {
            batch_size: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
