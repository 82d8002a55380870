//! Configuration management for guest insights
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (GUEST_INSIGHTS_ prefix, `__` separator)
//! - A standalone tagging thresholds file
//!
//! All engine thresholds live in [`TaggingConfig`]; defaults are in
//! [`constants`].

pub mod constants;
pub mod settings;
pub mod tagging;

pub use settings::{
    load_settings, ObservabilityConfig, PersistenceConfig, RuntimeEnvironment, Settings,
    WorkerConfig,
};
pub use tagging::{
    ActivityThresholds, BehaviorThresholds, HourWindow, SpendThresholds, TaggingConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(field) => ConfigError::MissingField(field),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}
