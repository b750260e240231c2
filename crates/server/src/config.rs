//! Application configuration.
//!
//! Loaded from an optional TOML file; every section and field has a
//! default, so an empty file (or no file) yields a working setup.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:3000"
//! request_timeout_ms = 10000
//!
//! [data]
//! dataset = "data/catalog.json"
//!
//! [engine]
//! candidate_multiplier = 3
//! default_limit = 10
//! max_limit = 50
//! recency_half_life_days = 30.0
//!
//! [engine.weights]
//! base = 1.0
//! affinity = 0.6
//!
//! [retry.standard]
//! max_attempts = 3
//! backoff = "exponential"
//! base_delay_ms = 100
//! max_delay_ms = 1000
//! ```

use pipeline::ScoringWeights;
use resilience::RetryPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub engine: EngineSettings,
    pub retry: RetryPresets,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dataset: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data/catalog.json"),
        }
    }
}

/// Tuning knobs for the recommendation engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub weights: ScoringWeights,
    /// Candidate pool = multiplier × limit + |exclude_ids|
    pub candidate_multiplier: usize,
    pub default_limit: usize,
    pub max_limit: usize,
    pub recency_half_life_days: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            candidate_multiplier: 3,
            default_limit: 10,
            max_limit: 50,
            recency_half_life_days: 30.0,
        }
    }
}

/// The named retry presets. Each policy is validated as it is parsed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPresets {
    pub standard: RetryPolicy,
    pub fast_best_effort: RetryPolicy,
}

impl Default for RetryPresets {
    fn default() -> Self {
        Self {
            standard: RetryPolicy::standard(),
            fast_best_effort: RetryPolicy::fast_best_effort(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.trim().is_empty() {
            return Err(invalid("server.bind", "must not be empty"));
        }
        if self.server.request_timeout_ms == 0 {
            return Err(invalid("server.request_timeout_ms", "must be positive"));
        }

        let engine = &self.engine;
        if !engine.weights.is_valid() {
            return Err(invalid("engine.weights", "weights must be finite and non-negative"));
        }
        if engine.candidate_multiplier == 0 {
            return Err(invalid("engine.candidate_multiplier", "must be at least 1"));
        }
        if engine.max_limit == 0 {
            return Err(invalid("engine.max_limit", "must be at least 1"));
        }
        if engine.default_limit == 0 || engine.default_limit > engine.max_limit {
            return Err(invalid(
                "engine.default_limit",
                format!("must be within 1..={}", engine.max_limit),
            ));
        }
        if !(engine.recency_half_life_days.is_finite() && engine.recency_half_life_days > 0.0) {
            return Err(invalid("engine.recency_half_life_days", "must be positive"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resilience::BackoffStrategy;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.engine, EngineSettings::default());
        assert_eq!(config.retry, RetryPresets::default());
        assert_eq!(config.data.dataset, PathBuf::from("data/catalog.json"));
    }

    #[test]
    fn test_partial_sections_override() {
        let raw = r#"
            [server]
            bind = "127.0.0.1:8080"

            [engine]
            candidate_multiplier = 5

            [engine.weights]
            affinity = 1.5

            [retry.fast_best_effort]
            max_attempts = 4
            backoff = "fixed"
            base_delay_ms = 10
            max_delay_ms = 10
        "#;
        let config = AppConfig::from_toml_str(raw).unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.server.request_timeout_ms, 10_000);
        assert_eq!(config.engine.candidate_multiplier, 5);
        assert_eq!(config.engine.weights.affinity, 1.5);
        assert_eq!(config.engine.weights.base, 1.0);
        assert_eq!(config.retry.fast_best_effort.max_attempts(), 4);
        assert_eq!(config.retry.fast_best_effort.backoff(), BackoffStrategy::Fixed);
        assert_eq!(config.retry.standard, RetryPolicy::standard());
    }

    #[test]
    fn test_invalid_retry_policy_rejected() {
        let raw = r#"
            [retry.standard]
            max_attempts = 3
            base_delay_ms = 500
            max_delay_ms = 100
        "#;
        assert!(matches!(AppConfig::from_toml_str(raw), Err(ConfigError::Parse(_))));

        let raw = r#"
            [retry.standard]
            max_attempts = 0
            base_delay_ms = 1
            max_delay_ms = 1
        "#;
        assert!(matches!(AppConfig::from_toml_str(raw), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_engine_values_rejected() {
        let raw = "[engine]\ndefault_limit = 80\nmax_limit = 50\n";
        assert!(matches!(
            AppConfig::from_toml_str(raw),
            Err(ConfigError::Invalid { field: "engine.default_limit", .. })
        ));

        let raw = "[engine.weights]\nrecency = -1.0\n";
        assert!(matches!(
            AppConfig::from_toml_str(raw),
            Err(ConfigError::Invalid { field: "engine.weights", .. })
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = AppConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(AppConfig::load(None).is_ok());
    }
}
