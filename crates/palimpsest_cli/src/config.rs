//! CLI configuration (`palimpsest.toml`).
//!
//! Every section is optional; missing keys use the component defaults.

use palimpsest_graph::GraphConfig;
use palimpsest_log::NormalizeConfig;
use palimpsest_replay::ReplayConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "palimpsest.toml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit logs as JSON lines
    pub json_logs: bool,
    /// Normalization passes
    pub normalize: NormalizeConfig,
    /// Replay behavior
    pub replay: ReplayConfig,
    /// Graph construction
    pub graph: GraphConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "warn".to_owned(),
            json_logs: false,
            normalize: NormalizeConfig::default(),
            replay: ReplayConfig::default(),
            graph: GraphConfig::default(),
        }
    }
}

/// Configuration failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("could not read {}: {source}", path.display())]
    Read {
        /// Config path
        path: PathBuf,
        /// I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration
    #[error("invalid config {}: {message}", path.display())]
    Parse {
        /// Config path
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

impl Config {
    /// Parse configuration text
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid TOML or has unknown keys
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            message: e.message().to_owned(),
        })
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in
    /// the working directory is used when present, defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_owned(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text, &path),
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }
}
