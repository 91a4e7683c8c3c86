//! Engine configuration
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default, and a missing file yields the defaults.

use crate::models::{Dimension, NodeKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Undo records kept per document; the oldest is evicted beyond this
    pub max_history: usize,

    /// Container created when a 2D node has nowhere to go
    pub auto_container_type: String,

    /// Buffered state events per subscriber
    pub event_channel_capacity: usize,

    /// Fallback tracing filter for binaries when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history: 100,
            auto_container_type: "canvas".to_string(),
            event_channel_capacity: 128,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from `path`
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match tokio::fs::read_to_string(path).await {
            Ok(text) => serde_json::from_str::<Self>(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history == 0 {
            return Err(ConfigError::invalid("max_history must be greater than 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(ConfigError::invalid(
                "event_channel_capacity must be greater than 0",
            ));
        }
        match NodeKind::builtin(&self.auto_container_type) {
            Some(kind) if kind.dimension == Dimension::TwoD && kind.is_container => Ok(()),
            _ => Err(ConfigError::invalid(format!(
                "auto_container_type '{}' is not a built-in 2D container",
                self.auto_container_type
            ))),
        }
    }
}
