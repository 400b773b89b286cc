//! Layered configuration.
//!
//! Sources, later ones winning:
//!
//! 1. Built-in defaults
//! 2. `stratum.toml`
//! 3. Environment variables, `STRATUM_<SECTION>__<KEY>`
//!    (e.g. `STRATUM_STORAGE__MAX_CHUNKS_PER_FILE=10`)

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment, Provider,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::storage::MAX_CHUNKS_PER_FILE;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A source could not be parsed or did not match the expected shape.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A value parsed but is out of range.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Dotted key, e.g. `storage.max_chunks_per_file`.
        key: String,
        /// What is wrong with the value.
        message: String,
    },

    /// A required configuration file is absent.
    #[error("Configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

fn invalid(key: &str, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    }
}

fn one_of(key: &str, value: &str, allowed: &[&str]) -> Result<(), ConfigError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(invalid(
            key,
            format!("'{value}' is not one of {}", allowed.join(", ")),
        ))
    }
}

/// Storage configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the table files and the catalog.
    pub data_dir: PathBuf,
    /// Catalog file name inside `data_dir`.
    pub catalog_file: String,
    /// Chunks written to one file before rolling over (1..=50).
    pub max_chunks_per_file: usize,
    /// Call `fsync` after every chunk write.
    pub sync_on_append: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./stratum_data"),
            catalog_file: "storage.json".to_string(),
            max_chunks_per_file: MAX_CHUNKS_PER_FILE,
            sync_on_append: false,
        }
    }
}

impl StorageConfig {
    /// Default storage settings rooted at `data_dir`.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Full path of the catalog file.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(&self.catalog_file)
    }

    /// Validates this section.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CHUNKS_PER_FILE).contains(&self.max_chunks_per_file) {
            return Err(invalid(
                "storage.max_chunks_per_file",
                format!(
                    "{} is outside 1..={MAX_CHUNKS_PER_FILE}",
                    self.max_chunks_per_file
                ),
            ));
        }

        if self.catalog_file.is_empty() || self.catalog_file.contains(['/', '\\']) {
            return Err(invalid(
                "storage.catalog_file",
                format!("'{}' must be a plain file name", self.catalog_file),
            ));
        }

        Ok(())
    }
}

/// Logging section, consumed by binaries that install a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level: error, warn, info, debug or trace.
    ///
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Line format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Validates this section.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown level or format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        one_of(
            "logging.level",
            &self.level,
            &["error", "warn", "info", "debug", "trace"],
        )?;
        one_of("logging.format", &self.format, &["text", "json"])
    }
}

/// Complete configuration of a storage process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StratumConfig {
    /// `[storage]` section.
    pub storage: StorageConfig,
    /// `[logging]` section.
    pub logging: LoggingConfig,
}

impl StratumConfig {
    /// Defaults overlaid by `source`.
    fn layered(source: impl Provider) -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(source)
    }

    fn extract(figment: &Figment) -> Result<Self, ConfigError> {
        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Loads `stratum.toml` from the working directory.
    ///
    /// # Errors
    ///
    /// See [`StratumConfig::load_from_path`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("stratum.toml")
    }

    /// Loads defaults, then `path`, then `STRATUM_<SECTION>__<KEY>` variables.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    /// Values are not validated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] if a source is malformed.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment =
            Self::layered(Toml::file(path.as_ref())).merge(Env::prefixed("STRATUM_").split("__"));
        Self::extract(&figment)
    }

    /// Like [`StratumConfig::load_from_path`], but the file must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if `path` does not exist.
    pub fn load_required<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Self::load_from_path(path)
    }

    /// Parses a TOML document over the defaults, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] if the document is malformed.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Self::extract(&Self::layered(Toml::string(toml_str)))
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidValue`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate()?;
        self.logging.validate()
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
