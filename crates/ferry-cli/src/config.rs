//! Ferry configuration file
//!
//! Searched at `--config`, then `./ferry.toml`, then
//! `<config dir>/ferry/ferry.toml`. Missing files fall back to defaults;
//! command line flags override whatever was loaded.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ferry_core::{DEFAULT_PREVIEW_LIMIT, DatabaseEndpoint, FlatFileEndpoint};
use ferry_transfer::EngineConfig;

pub const CONFIG_FILE_NAME: &str = "ferry.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FerryConfig {
    pub database: DatabaseEndpoint,
    pub flat_file: FlatFileEndpoint,
    pub transfer: TransferSettings,
    pub logging: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferSettings {
    pub preview_limit: usize,
    pub insert_batch_size: usize,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            insert_batch_size: EngineConfig::default().insert_batch_size,
        }
    }
}

impl TransferSettings {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            insert_batch_size: self.insert_batch_size.max(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter directive; `RUST_LOG` wins when set
    pub filter: String,
    /// Also write JSON logs to a daily rolling file
    pub json_file: bool,
    /// Directory for the JSON log file
    pub log_dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "warn,ferry=info".to_string(),
            json_file: false,
            log_dir: None,
        }
    }
}

impl FerryConfig {
    /// Load from the first existing candidate path, or defaults
    ///
    /// An explicit path must exist.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load_from(path)?, Some(path.to_path_buf())));
        }

        for path in Self::search_paths() {
            if path.is_file() {
                let config = Self::load_from(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((Self::default(), None))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config {:?}", path))
    }

    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("ferry").join(CONFIG_FILE_NAME));
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = FerryConfig::default();
        assert_eq!(config.database.port, "8123");
        assert_eq!(config.flat_file.delimiter, ',');
        assert!(config.flat_file.has_header);
        assert_eq!(config.transfer.preview_limit, 10);
        assert_eq!(config.transfer.insert_batch_size, 10_000);
    }

    #[test]
    fn test_load_partial_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ferry.toml");
        std::fs::write(
            &path,
            r#"
[database]
host = "ch.internal"
port = "9443"
secure = true
token = "secret"

[flat_file]
path = "users.tsv"
delimiter = "\t"
has_header = false

[transfer]
preview_limit = 25
"#,
        )?;

        let (config, found) = FerryConfig::load(Some(&path))?;
        assert_eq!(found.as_deref(), Some(path.as_path()));
        assert_eq!(config.database.host, "ch.internal");
        assert_eq!(config.database.port, "9443");
        assert_eq!(config.database.database, "default");
        assert!(config.database.secure);
        assert_eq!(config.flat_file.delimiter, '\t');
        assert!(!config.flat_file.has_header);
        assert_eq!(config.transfer.preview_limit, 25);
        assert_eq!(config.transfer.insert_batch_size, 10_000);
        assert_eq!(config.logging.filter, "warn,ferry=info");
        Ok(())
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(FerryConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_invalid_toml_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ferry.toml");
        std::fs::write(&path, "[database\nhost = 1")?;
        let err = FerryConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
        Ok(())
    }

    #[test]
    fn test_search_order_starts_in_working_directory() {
        let paths = FerryConfig::search_paths();
        assert_eq!(paths[0], PathBuf::from("ferry.toml"));
    }

    #[test]
    fn test_engine_config_never_uses_zero_batch() {
        let settings = TransferSettings {
            preview_limit: 10,
            insert_batch_size: 0,
        };
        assert_eq!(settings.engine_config().insert_batch_size, 1);
    }
}
