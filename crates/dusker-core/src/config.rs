//! Configuration
//!
//! Loaded from a TOML file (`dusker.toml` by default). Every key is optional;
//! a missing file means the defaults.
//!
//! ```toml
//! [store]
//! database_path = "dusker.db"
//! aggregate_mode = "recompute"   # or "incremental"
//! merge_policy = "incoming_wins" # or "stored_wins"
//!
//! [logging]
//! profile = "development"        # "production", "test"
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::MergePolicy;
use crate::errors::{DuskerError, Result};
use crate::logging_facility::Profile;
use crate::session_store::{AggregateMode, StoreOptions};

pub const DEFAULT_CONFIG_FILE: &str = "dusker.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuskerConfig {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file; relative paths resolve against the working directory
    pub database_path: PathBuf,
    pub aggregate_mode: AggregateMode,
    pub merge_policy: MergePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("dusker.db"),
            aggregate_mode: AggregateMode::default(),
            merge_policy: MergePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub profile: Profile,
}

impl DuskerConfig {
    /// Load from `path`, falling back to defaults when the file does not exist
    ///
    /// # Errors
    ///
    /// `Config` if the file exists but cannot be read or parsed.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents).map_err(|e| DuskerError::Config {
                message: format!("{}: {e}", path.display()),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(DuskerError::Config {
                message: format!("cannot read {}: {e}", path.display()),
            }),
        }
    }

    /// # Errors
    ///
    /// `Config` on malformed TOML or unknown enum values.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| DuskerError::Config {
            message: e.to_string(),
        })
    }

    /// # Errors
    ///
    /// `Config` if the configuration cannot be rendered.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DuskerError::Config {
            message: e.to_string(),
        })
    }
}

impl From<&StoreConfig> for StoreOptions {
    fn from(config: &StoreConfig) -> Self {
        Self {
            aggregate_mode: config.aggregate_mode,
            merge_policy: config.merge_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DuskerConfig::load_from_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, DuskerConfig::default());
        assert_eq!(config.store.database_path, PathBuf::from("dusker.db"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = DuskerConfig::from_toml_str(
            r#"
            [store]
            aggregate_mode = "incremental"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.aggregate_mode, AggregateMode::Incremental);
        assert_eq!(config.store.merge_policy, MergePolicy::IncomingWins);
        assert_eq!(config.logging.profile, Profile::Development);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nmerge_policy = \"whoever\"").unwrap();

        let err = DuskerConfig::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, DuskerError::Config { .. }));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = DuskerConfig::default();
        config.store.merge_policy = MergePolicy::StoredWins;
        config.logging.profile = Profile::Production;

        let text = config.to_toml_string().unwrap();
        assert_eq!(DuskerConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_store_options_from_config() {
        let store = StoreConfig {
            aggregate_mode: AggregateMode::Incremental,
            merge_policy: MergePolicy::StoredWins,
            ..StoreConfig::default()
        };
        let options = StoreOptions::from(&store);
        assert_eq!(options.aggregate_mode, AggregateMode::Incremental);
        assert_eq!(options.merge_policy, MergePolicy::StoredWins);
    }
}
