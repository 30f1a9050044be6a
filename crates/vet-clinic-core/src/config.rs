//! Clinic configuration.
//!
//! Loaded from a JSON file; missing keys fall back to defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Scheduling and lookup settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    /// Duration in hours for bookings without a type
    pub default_duration_hours: f64,
    /// Sequence given to new booking type / combination links
    pub type_link_sequence: i64,
    /// Minimum Jaro-Winkler similarity for fuzzy patient search
    pub fuzzy_threshold: f64,
    /// Result cap for patient searches
    pub search_limit: usize,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            default_duration_hours: 0.5,
            type_link_sequence: 10,
            fuzzy_threshold: 0.8,
            search_limit: 20,
        }
    }
}

impl ClinicConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, or defaults when the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), "Loaded clinic config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_duration_hours.is_finite() || self.default_duration_hours <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "default_duration_hours must be positive, got {}",
                self.default_duration_hours
            )));
        }
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(ConfigError::Invalid(format!(
                "fuzzy_threshold must be within 0..=1, got {}",
                self.fuzzy_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClinicConfig::default();
        assert_eq!(config.default_duration_hours, 0.5);
        assert_eq!(config.type_link_sequence, 10);
        assert_eq!(config.fuzzy_threshold, 0.8);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ClinicConfig::from_json_str(r#"{"default_duration_hours": 1.0}"#).unwrap();
        assert_eq!(config.default_duration_hours, 1.0);
        assert_eq!(config.type_link_sequence, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ClinicConfig::from_json_str(r#"{"default_duration_hours": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ClinicConfig::from_json_str(r#"{"fuzzy_threshold": 1.5}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ClinicConfig::from_json_str("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinic.json");

        assert_eq!(ClinicConfig::load(&path).unwrap(), ClinicConfig::default());

        std::fs::write(&path, r#"{"type_link_sequence": 5, "search_limit": 50}"#).unwrap();
        let config = ClinicConfig::load(&path).unwrap();
        assert_eq!(config.type_link_sequence, 5);
        assert_eq!(config.search_limit, 50);
    }
}
