//! Hook configuration
//!
//! Loaded from CLI flags or a JSON file. Every field has a default so a partial
//! file is enough.

use crate::domain::validation::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default cap on executions performed by one trigger
pub const DEFAULT_MAX_CROSSINGS_PER_TRIGGER: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Smallest accepted placement (inclusive)
    pub min_order_size: u128,

    /// Largest accepted placement (inclusive)
    pub max_order_size: u128,

    /// Executions allowed per post-swap trigger before the remainder is
    /// deferred to the next trigger for the pool
    pub max_crossings_per_trigger: usize,
}

impl Default for HookConfig {
    fn default() -> Self {
        let validation = ValidationConfig::default();
        Self {
            min_order_size: validation.min_order_size,
            max_order_size: validation.max_order_size,
            max_crossings_per_trigger: DEFAULT_MAX_CROSSINGS_PER_TRIGGER,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HookConfig {
    pub fn with_min_order_size(mut self, min_order_size: u128) -> Self {
        self.min_order_size = min_order_size;
        self
    }

    pub fn with_max_crossings(mut self, max_crossings_per_trigger: usize) -> Self {
        self.max_crossings_per_trigger = max_crossings_per_trigger;
        self
    }

    /// Placement rules handed to the validator
    pub fn validation(&self) -> ValidationConfig {
        ValidationConfig {
            min_order_size: self.min_order_size,
            max_order_size: self.max_order_size,
        }
    }

    /// Reads a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }
}
