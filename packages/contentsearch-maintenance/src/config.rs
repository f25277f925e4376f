//! Maintenance configuration (YAML schema v1)
//!
//! ```yaml
//! version: 1
//! initial_state: started
//! parallel:
//!   enabled: true
//!   max_degree_of_parallelism: 4
//! events:
//!   queue_capacity: 1024
//! ```

use crate::context::ParallelOptions;
use crate::gating::IndexingState;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const SUPPORTED_VERSIONS: &[u32] = &[1];
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const MAX_DEGREE_OF_PARALLELISM: usize = 256;
pub const ENV_MAX_PARALLELISM: &str = "CONTENTSEARCH_MAX_PARALLELISM";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing 'version' field in configuration file. Add 'version: 1' to the top of your YAML file.")]
    MissingVersion,

    #[error("Unsupported configuration version {found}. Supported versions: {}", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    #[error("Invalid range for field '{field}': {value} not in {min}..={max}")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("Invalid value for environment variable {var}: {value}")]
    Env { var: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    pub fn range(
        field: impl Into<String>,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
    ) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }
}

/// Parallel batch settings, read by update-context providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParallelConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_degree_of_parallelism: Option<usize>,
}

impl ParallelConfig {
    pub fn options(&self) -> ParallelOptions {
        ParallelOptions {
            max_degree_of_parallelism: self.max_degree_of_parallelism,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaintenanceConfig {
    /// Schema version (always 1 for v1)
    pub version: Option<u32>,

    #[serde(default)]
    pub initial_state: IndexingState,

    #[serde(default)]
    pub parallel: ParallelConfig,

    #[serde(default)]
    pub events: EventsConfig,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            version: Some(1),
            initial_state: IndexingState::Started,
            parallel: ParallelConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

impl MaintenanceConfig {
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: MaintenanceConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let version = self.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        if let Some(max) = self.parallel.max_degree_of_parallelism {
            if !(1..=MAX_DEGREE_OF_PARALLELISM).contains(&max) {
                return Err(ConfigError::range(
                    "parallel.max_degree_of_parallelism",
                    max,
                    1,
                    MAX_DEGREE_OF_PARALLELISM,
                ));
            }
        }

        if self.events.queue_capacity == 0 {
            return Err(ConfigError::range(
                "events.queue_capacity",
                0,
                1,
                usize::MAX,
            ));
        }

        Ok(())
    }

    /// Apply `CONTENTSEARCH_MAX_PARALLELISM` if set
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        match std::env::var(ENV_MAX_PARALLELISM) {
            Ok(raw) => self.with_max_parallelism_override(&raw),
            Err(_) => Ok(self),
        }
    }

    fn with_max_parallelism_override(mut self, raw: &str) -> ConfigResult<Self> {
        let max = raw.trim().parse::<usize>().map_err(|_| ConfigError::Env {
            var: ENV_MAX_PARALLELISM.to_string(),
            value: raw.to_string(),
        })?;
        self.parallel.max_degree_of_parallelism = Some(max);
        self.validate()?;
        Ok(self)
    }
}
