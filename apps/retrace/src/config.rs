//! # Application Configuration
//!
//! TOML configuration file with an environment override for the history
//! capacity.
//!
//! ```toml
//! [history]
//! capacity = 200
//! enabled = true
//! ```

use retrace_core::{HistoryConfig, HistoryError};
use serde::{Deserialize, Serialize};

/// Environment variable overriding `history.capacity`.
pub const CAPACITY_ENV: &str = "RETRACE_HISTORY_CAPACITY";

/// Top-level configuration file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub history: HistoryConfig,
}

impl AppConfig {
    /// Parse a TOML document. Missing tables and keys take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, HistoryError> {
        toml::from_str(contents).map_err(|e| HistoryError::InvalidConfig(e.to_string()))
    }

    /// Apply the raw value of `RETRACE_HISTORY_CAPACITY`, if set.
    pub fn with_capacity_override(mut self, raw: Option<&str>) -> Result<Self, HistoryError> {
        if let Some(raw) = raw {
            let capacity = raw.trim().parse::<usize>().map_err(|e| {
                HistoryError::InvalidConfig(format!("{}='{}': {}", CAPACITY_ENV, raw, e))
            })?;
            tracing::debug!(capacity, "History capacity overridden from environment");
            self.history.capacity = capacity;
        }
        Ok(self)
    }

    /// Validate and return the configuration.
    pub fn validated(self) -> Result<Self, HistoryError> {
        self.history.validate()?;
        Ok(self)
    }
}
