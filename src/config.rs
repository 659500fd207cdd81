use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use thiserror::Error;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_TAX_RATE_BPS: u32 = 600; // 6% flat rate
const DEFAULT_DEPOSIT_PCT_BPS: u32 = 2500; // 25% of total

#[derive(Debug, Error)]
pub enum EngineConfigError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Engine configuration with validation.
///
/// Values are layered: `config/default.toml`, then `config/{environment}.toml`
/// if present, then `RENTFLOW_`-prefixed environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct EngineConfig {
    /// Database connection URL
    pub database_url: String,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Sales tax rate in basis points (600 = 6%)
    #[serde(default = "default_tax_rate_bps")]
    #[validate(range(max = 10_000))]
    pub tax_rate_bps: u32,

    /// Default deposit percentage of order total, in basis points
    #[serde(default = "default_deposit_pct_bps")]
    #[validate(range(max = 10_000))]
    pub deposit_pct_bps: u32,

    /// Whether reconciliation dispatches customer notifications
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    /// Warehouse latitude, the origin for travel-fee distance lookups
    #[serde(default = "default_warehouse_latitude")]
    pub warehouse_latitude: f64,

    /// Warehouse longitude
    #[serde(default = "default_warehouse_longitude")]
    pub warehouse_longitude: f64,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_tax_rate_bps() -> u32 {
    DEFAULT_TAX_RATE_BPS
}

fn default_deposit_pct_bps() -> u32 {
    DEFAULT_DEPOSIT_PCT_BPS
}

fn default_true() -> bool {
    true
}

// The Tampa warehouse; overridden per deployment.
fn default_warehouse_latitude() -> f64 {
    27.9506
}

fn default_warehouse_longitude() -> f64 {
    -82.4572
}

impl EngineConfig {
    /// Loads configuration from files and environment.
    pub fn load() -> Result<Self, EngineConfigError> {
        let environment = env::var("RENTFLOW_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

        let config: EngineConfig = Config::builder()
            .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
            .add_source(
                File::with_name(&format!("{}/{}", CONFIG_DIR, environment)).required(false),
            )
            .add_source(Environment::with_prefix("RENTFLOW").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        info!(
            environment = %config.environment,
            tax_rate_bps = config.tax_rate_bps,
            "Engine configuration loaded"
        );
        Ok(config)
    }

    /// A minimal configuration for embedding the engine in tests.
    pub fn for_tests(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            log_json: false,
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            deposit_pct_bps: DEFAULT_DEPOSIT_PCT_BPS,
            notifications_enabled: false,
            warehouse_latitude: default_warehouse_latitude(),
            warehouse_longitude: default_warehouse_longitude(),
            auto_migrate: true,
        }
    }
}
