use crate::core::{LoreError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    pub log: Option<LogConfig>,
}

/// Store-related configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite file, or ":memory:"
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
pub struct LogConfig {
    pub level: Option<String>,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreConfig { path: path.into() }
    }

    pub fn in_memory() -> Self {
        StoreConfig::new(":memory:")
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == ":memory:"
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::new(default_store_path())
    }
}

impl Config {
    /// Maximum tracing level, `info` unless configured.
    pub fn log_level(&self) -> Result<tracing::Level> {
        match self.log.as_ref().and_then(|log| log.level.as_deref()) {
            Some(level) => tracing::Level::from_str(level)
                .map_err(|e| LoreError::Config(format!("invalid log level `{}`: {}", level, e))),
            None => Ok(tracing::Level::INFO),
        }
    }
}

/// `<data_dir>/lorekeeper/db.sqlite`, or `db.sqlite` in the working
/// directory when the platform has no data directory.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("lorekeeper").join("db.sqlite"))
        .unwrap_or_else(|| PathBuf::from("db.sqlite"))
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = lorekeeper::config::load_config("lorekeeper.toml").expect("Failed to load config");
/// println!("{:?}", config.store.path);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| LoreError::Config(e.to_string()))
}
