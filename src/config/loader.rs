//! Configuration Loader
//!
//! Environment-aware configuration loading. Layers compiled defaults, an
//! optional TOML file and `LIFT_`-prefixed environment variables, in that order.

use super::error::{ConfigResult, ConfigurationError};
use super::DispatchConfig;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Prefix for environment overrides, e.g. `LIFT_QUEUE__WORKER_COUNT=4`
pub const ENV_PREFIX: &str = "LIFT";

/// Default location searched by [`ConfigManager::load`] (extension optional)
pub const DEFAULT_CONFIG_BASENAME: &str = "config/lift-dispatch";

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: DispatchConfig,
    environment: String,
    config_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with(None, ENV_PREFIX)
    }

    /// Load configuration from a specific TOML file (required to exist)
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with(Some(path.as_ref().to_path_buf()), ENV_PREFIX)
    }

    /// Load configuration with an explicit file and environment prefix.
    /// A custom prefix keeps tests from reading each other's variables.
    pub fn load_with(
        config_file: Option<PathBuf>,
        env_prefix: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();

        debug!(
            environment = %environment,
            config_file = ?config_file,
            env_prefix = env_prefix,
            "Loading dispatch configuration"
        );

        let defaults = Config::try_from(&DispatchConfig::default())
            .map_err(|e| ConfigurationError::load_error("defaults", e))?;

        let mut builder = Config::builder().add_source(defaults);

        builder = match &config_file {
            Some(path) => builder.add_source(File::from(path.as_path()).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("elevators.start_floors"),
        );

        let source_name = config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| DEFAULT_CONFIG_BASENAME.to_string());

        let config: DispatchConfig = builder
            .build()
            .and_then(|c| c.try_deserialize::<DispatchConfig>())
            .map_err(|e| ConfigurationError::load_error(&source_name, e))?;

        config.validate()?;

        info!(
            environment = %environment,
            units = config.unit_count(),
            workers = config.queue.worker_count,
            capacity = config.queue.capacity,
            strategy = %config.dispatch.strategy,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment,
            config_file,
        }))
    }

    /// Wrap an already-built configuration, validating it first
    pub fn from_config(config: DispatchConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: Self::detect_environment(),
            config_file: None,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Detect the runtime environment from `LIFT_ENV`, falling back to `APP_ENV`
    pub fn detect_environment() -> String {
        env::var("LIFT_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }
}
