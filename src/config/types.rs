//! Configuration types.

use serde::{Deserialize, Serialize};

use crate::provider::ProviderConfig;
use crate::types::{AssistError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider selection and credentials
    pub ai: ProviderConfig,
    /// Per-action rate presets
    pub limits: LimitsConfig,
}

/// Per-action "N requests per minute" presets. Burst capacity equals N.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub summarize_per_minute: u32,
    pub suggest_per_minute: u32,
    pub coach_per_minute: u32,
    pub duplicates_per_minute: u32,
    pub nl_filter_per_minute: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            summarize_per_minute: 8,
            suggest_per_minute: 12,
            coach_per_minute: 6,
            duplicates_per_minute: 6,
            nl_filter_per_minute: 30,
        }
    }
}

impl Config {
    /// Validate after loading.
    pub fn validate(&self) -> Result<()> {
        if self.ai.timeout_secs == 0 {
            return Err(AssistError::Config(
                "ai.timeout_secs must be greater than zero".to_string(),
            ));
        }
        let limits = [
            ("limits.summarize_per_minute", self.limits.summarize_per_minute),
            ("limits.suggest_per_minute", self.limits.suggest_per_minute),
            ("limits.coach_per_minute", self.limits.coach_per_minute),
            ("limits.duplicates_per_minute", self.limits.duplicates_per_minute),
            ("limits.nl_filter_per_minute", self.limits.nl_filter_per_minute),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(AssistError::Config(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_default_provider_is_mock() {
        assert_eq!(Config::default().ai.provider, "mock");
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut config = Config::default();
        config.limits.coach_per_minute = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.ai.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
