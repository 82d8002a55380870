//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, TaggingConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Classifier and trigger thresholds
    #[serde(default)]
    pub tagging: TaggingConfig,

    /// Optional YAML file that replaces `tagging` wholesale
    #[serde(default)]
    pub tagging_config_path: Option<String>,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Batch worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Restaurants recomputed at the same time
    #[serde(default = "default_max_concurrent_restaurants")]
    pub max_concurrent_restaurants: usize,

    /// Attempts per restaurant batch before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff between attempts (doubles each retry)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Only read orders newer than this many days (None = full history)
    #[serde(default)]
    pub lookback_days: Option<u32>,

    /// Restaurants to process (empty = every restaurant the source knows)
    #[serde(default)]
    pub restaurants: Vec<String>,

    /// Seconds between full recomputations (None = run once and exit)
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

fn default_max_concurrent_restaurants() -> usize {
    4
}
fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    500
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_restaurants: default_max_concurrent_restaurants(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            lookback_days: None,
            restaurants: Vec::new(),
            interval_secs: None,
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PersistenceConfig {
    /// JSON snapshot used to seed the in-memory store
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_metrics_port() -> u16 {
    9090
}
fn default_true() -> bool {
    true
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
            metrics_port: default_metrics_port(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tagging.validate()?;
        self.validate_worker()?;
        self.validate_observability()?;
        Ok(())
    }

    fn validate_worker(&self) -> Result<(), ConfigError> {
        if self.worker.max_concurrent_restaurants == 0 {
            return Err(ConfigError::InvalidValue {
                field: "worker.max_concurrent_restaurants".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.worker.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "worker.max_attempts".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.worker.interval_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "worker.interval_secs".to_string(),
                message: "Must be positive when set".to_string(),
            });
        }

        if self.worker.lookback_days == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "worker.lookback_days".to_string(),
                message: "Must be positive when set".to_string(),
            });
        }

        Ok(())
    }

    fn validate_observability(&self) -> Result<(), ConfigError> {
        let level = self.observability.log_level.to_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "observability.log_level".to_string(),
                message: format!("Unknown level '{}'", self.observability.log_level),
            });
        }

        if self.environment.is_strict()
            && self.observability.metrics_enabled
            && self.observability.metrics_port == 0
        {
            return Err(ConfigError::InvalidValue {
                field: "observability.metrics_port".to_string(),
                message: "Metrics port required when metrics are enabled".to_string(),
            });
        }

        Ok(())
    }
}

/// Load settings from files and environment
///
/// Priority: env vars > config/{env}.yaml > config/default.yaml > defaults.
/// When `tagging_config_path` is set the tagging thresholds are read from
/// that file instead.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("GUEST_INSIGHTS")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let mut settings: Settings = config.try_deserialize()?;

    if let Some(path) = settings.tagging_config_path.clone() {
        tracing::debug!(path = %path, "Loading tagging thresholds from file");
        settings.tagging = TaggingConfig::load(&path)?;
    }

    settings.validate()?;

    Ok(settings)
}
