//! Counter configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.
//! Configuration is built programmatically via `CounterConfig::default()`
//! plus builder methods, or loaded from a JSON file.

use crate::error::{TpsError, Result};
use crate::timestamp::TimestampUnit;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default number of history messages fetched per report
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

/// Default reporter tag attached to report metadata
pub const DEFAULT_SOURCE: &str = "a3s-tps";

/// Default prefix of the report text
pub const DEFAULT_LABEL: &str = "▣";

/// Configuration for [`TpsCounter`](crate::TpsCounter)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterConfig {
    /// Maximum number of messages requested from the history query
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Delay before fetching history, giving the host time to persist
    /// the final parts of a turn
    #[serde(default)]
    pub settle_delay_ms: u64,

    /// Unit of host timestamps
    #[serde(default)]
    pub timestamp_unit: TimestampUnit,

    /// Tag stored in the report's metadata
    #[serde(default = "default_source")]
    pub source: String,

    /// Prefix of the report text
    #[serde(default = "default_label")]
    pub label: String,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            settle_delay_ms: 0,
            timestamp_unit: TimestampUnit::default(),
            source: default_source(),
            label: default_label(),
        }
    }
}

impl CounterConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            TpsError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = serde_json::from_str(&json).map_err(|e| {
            TpsError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "Counter config loaded");
        Ok(config)
    }

    /// Reject values the counter cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.history_limit == 0 {
            return Err(TpsError::Config(
                "historyLimit must be greater than zero".to_string(),
            ));
        }
        if self.source.trim().is_empty() {
            return Err(TpsError::Config("source must not be empty".to_string()));
        }
        Ok(())
    }

    /// Settle delay as a `Duration`
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_timestamp_unit(mut self, unit: TimestampUnit) -> Self {
        self.timestamp_unit = unit;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}
