//! # History Configuration
//!
//! Settings for a `HistoryEngine`, deserializable from the `[history]`
//! table of a TOML file. Missing keys fall back to the compiled defaults.

use crate::HistoryError;
use crate::primitives::{DEFAULT_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY};
use serde::{Deserialize, Serialize};

/// Configuration for a history engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Maximum number of entries in the undo stack.
    pub capacity: usize,
    /// Whether the engine starts enabled.
    pub enabled: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            enabled: true,
        }
    }
}

impl HistoryConfig {
    /// Override the capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), HistoryError> {
        if self.capacity == 0 {
            return Err(HistoryError::InvalidConfig(
                "capacity must be at least 1".to_string(),
            ));
        }
        if self.capacity > MAX_HISTORY_CAPACITY {
            return Err(HistoryError::InvalidConfig(format!(
                "capacity {} exceeds maximum {}",
                self.capacity, MAX_HISTORY_CAPACITY
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = HistoryConfig::default();
        assert_eq!(config.capacity, 50);
        assert!(config.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_rejected() {
        let config = HistoryConfig::default().with_capacity(0);
        assert!(matches!(
            config.validate(),
            Err(HistoryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn oversized_capacity_rejected() {
        let config = HistoryConfig::default().with_capacity(MAX_HISTORY_CAPACITY + 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_keys_use_defaults() {
        let config: HistoryConfig =
            serde_json::from_str(r#"{ "capacity": 8 }"#).expect("decode");
        assert_eq!(config.capacity, 8);
        assert!(config.enabled);
    }
}
