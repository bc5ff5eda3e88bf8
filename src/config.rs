use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

use crate::pos::ClientOptions;
use crate::scheduler::RefreshInterval;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 5;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_ITEMS_PAGE_SIZE: u32 = 200;
const DEFAULT_CATEGORIES_PAGE_SIZE: u32 = 100;
const DEFAULT_MAX_PAGES: u32 = 50;
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Application configuration structure with validation.
///
/// POS credentials are not part of it: they are supplied at runtime as
/// [`crate::pos::ConnectionSettings`] and never read from files or the environment.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging); always on in production
    #[serde(default)]
    pub log_json: bool,

    /// Catalog refresh period; must be one of 15, 30, 60, 120, 300
    #[serde(default = "default_refresh_interval_secs")]
    #[validate(custom = "validate_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Whether the scheduler polls the catalog once connected
    #[serde(default = "default_true_bool")]
    pub auto_refresh: bool,

    /// Items at or below this quantity count as low stock
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: u32,

    /// HTTP timeout for catalog calls (seconds)
    #[serde(default = "default_http_timeout_secs")]
    #[validate(range(min = 1, max = 120))]
    pub http_timeout_secs: u64,

    /// Page size when listing items
    #[serde(default = "default_items_page_size")]
    #[validate(range(min = 1, max = 1000))]
    pub items_page_size: u32,

    /// Page size when listing categories
    #[serde(default = "default_categories_page_size")]
    #[validate(range(min = 1, max = 1000))]
    pub categories_page_size: u32,

    /// Maximum pages followed per collection
    #[serde(default = "default_max_pages")]
    #[validate(range(min = 1, max = 1000))]
    pub max_pages: u32,

    /// Event channel capacity for notifications
    #[serde(default = "default_event_channel_capacity")]
    #[validate(range(min = 1))]
    pub event_channel_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            refresh_interval_secs: default_refresh_interval_secs(),
            auto_refresh: default_true_bool(),
            low_stock_threshold: default_low_stock_threshold(),
            http_timeout_secs: default_http_timeout_secs(),
            items_page_size: default_items_page_size(),
            categories_page_size: default_categories_page_size(),
            max_pages: default_max_pages(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl AppConfig {
    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// JSON logs when asked for explicitly or when running in production.
    pub fn structured_logs(&self) -> bool {
        self.log_json || self.is_production()
    }

    /// Configured refresh interval. Falls back to 30s if the raw value was
    /// never validated.
    pub fn refresh_interval(&self) -> RefreshInterval {
        RefreshInterval::from_secs(self.refresh_interval_secs).unwrap_or_default()
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.http_timeout_secs),
            items_page_size: self.items_page_size,
            categories_page_size: self.categories_page_size,
            max_pages: self.max_pages,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_true_bool() -> bool {
    true
}

fn default_low_stock_threshold() -> u32 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_items_page_size() -> u32 {
    DEFAULT_ITEMS_PAGE_SIZE
}

fn default_categories_page_size() -> u32 {
    DEFAULT_CATEGORIES_PAGE_SIZE
}

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_refresh_interval(secs: u64) -> Result<(), ValidationError> {
    if RefreshInterval::from_secs(secs).is_some() {
        Ok(())
    } else {
        let mut err = ValidationError::new("refresh_interval_secs");
        err.message = Some("Must be one of: 15, 30, 60, 120, 300".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("clover_inventory={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration from the current directory.
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Same as [`load_config`], reading files from `config_dir`.
pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("environment", run_env.as_str())?
        .add_source(File::with_name(&config_dir.join("default").to_string_lossy()).required(false))
        .add_source(File::with_name(&config_dir.join(&run_env).to_string_lossy()).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, filename: &str, content: &str) {
        fs::write(dir.path().join(filename), content).unwrap();
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.refresh_interval(), RefreshInterval::Secs30);
        assert_eq!(cfg.low_stock_threshold, 5);
        assert!(!cfg.structured_logs());
    }

    #[test]
    fn production_environment_switches_to_json_logs() {
        let cfg = AppConfig {
            environment: "Production".into(),
            ..AppConfig::default()
        };
        assert!(cfg.is_production());
        assert!(cfg.structured_logs());

        let explicit = AppConfig {
            log_json: true,
            ..AppConfig::default()
        };
        assert!(explicit.structured_logs());
    }

    #[test]
    fn refresh_interval_validator_accepts_listed_values() {
        for secs in [15, 30, 60, 120, 300] {
            assert!(validate_refresh_interval(secs).is_ok());
        }
        assert!(validate_refresh_interval(0).is_err());
    }

    #[test]
    fn unsupported_refresh_interval_is_rejected() {
        let cfg = AppConfig {
            refresh_interval_secs: 45,
            ..AppConfig::default()
        };
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("refresh_interval_secs"));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let cfg = AppConfig {
            log_level: "loud".into(),
            ..AppConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn client_options_follow_config() {
        let cfg = AppConfig {
            http_timeout_secs: 3,
            items_page_size: 50,
            ..AppConfig::default()
        };
        let options = cfg.client_options();
        assert_eq!(options.timeout, Duration::from_secs(3));
        assert_eq!(options.items_page_size, 50);
        assert_eq!(options.categories_page_size, 100);
    }

    #[test]
    fn loads_values_from_default_file() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "default.toml",
            r#"
                log_level = "debug"
                refresh_interval_secs = 60
                low_stock_threshold = 3
            "#,
        );

        let cfg = load_config_from(dir.path()).unwrap();
        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.refresh_interval(), RefreshInterval::Minute1);
        assert_eq!(cfg.low_stock_threshold, 3);
        assert!(cfg.auto_refresh);
    }

    #[test]
    fn invalid_file_values_fail_validation() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "default.toml", "refresh_interval_secs = 7\n");

        let result = load_config_from(dir.path());
        assert!(matches!(result, Err(AppConfigError::Validation(_))));
    }

    #[test]
    fn page_cap_is_bounded() {
        let cfg = AppConfig {
            max_pages: 1001,
            ..AppConfig::default()
        };
        assert!(cfg.validate().unwrap_err().field_errors().contains_key("max_pages"));
    }
}
