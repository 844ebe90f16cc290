//! Configuration loader
//!
//! Sources are merged in this order (later sources override earlier):
//! 1. `AppConfig::default()`
//! 2. A TOML file, explicit or discovered
//! 3. `REDIS_URL`, mapped onto `store.url`
//! 4. Variables prefixed `BULWARK_`, nested with `__` (e.g. `BULWARK_QUEUE__WORKERS=8`)

use crate::config::AppConfig;
use crate::constants::{
    CONFIG_ENV_PREFIX, CONFIG_ENV_SEPARATOR, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME,
    REDIS_URL_ENV_VAR,
};
use crate::error_ext::ErrorContext;
use crate::logging::{log_config_loaded, parse_log_level};
use bulwark_domain::error::{Error, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::env;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Configuration loader service
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load and validate configuration from all sources
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Some(config_path) = &self.config_path {
            if config_path.exists() {
                figment = figment.merge(Toml::file(config_path));
                log_config_loaded(config_path, true);
            } else {
                log_config_loaded(config_path, false);
            }
        } else if let Some(default_path) = Self::find_default_config_path() {
            figment = figment.merge(Toml::file(&default_path));
            log_config_loaded(&default_path, true);
        }

        figment = figment
            .merge(
                Env::raw()
                    .only(&[REDIS_URL_ENV_VAR])
                    .map(|_| "store.url".into()),
            )
            .merge(
                Env::prefixed(&format!("{}_", self.env_prefix)).split(CONFIG_ENV_SEPARATOR),
            );

        let app_config: AppConfig = figment
            .extract()
            .config_context("Failed to extract configuration")?;

        validate_app_config(&app_config)?;
        Ok(app_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, config: &AppConfig, path: P) -> Result<()> {
        let toml_string = to_toml(config)?;
        std::fs::write(path.as_ref(), toml_string)?;
        Ok(())
    }

    /// Get the current configuration file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// First existing default location of the configuration file
    fn find_default_config_path() -> Option<PathBuf> {
        let current_dir = env::current_dir().ok()?;

        let candidates = [
            Some(current_dir.join(DEFAULT_CONFIG_FILENAME)),
            Some(
                current_dir
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILENAME),
            ),
            dirs::config_dir().map(|d| d.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME)),
        ];

        candidates.into_iter().flatten().find(|path| path.exists())
    }
}

/// Render a configuration as TOML
pub fn to_toml(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).config_context("Failed to serialize config to TOML")
}

/// Validate application configuration
///
/// Every failure is a configuration error; an absent store URL is not one.
pub fn validate_app_config(config: &AppConfig) -> Result<()> {
    config.validate().map_err(|e| {
        Error::configuration_with_source(format!("Invalid configuration: {e}"), e)
    })?;
    validate_store_config(config)?;
    validate_cache_config(config)?;
    validate_rate_limit_config(config)?;
    parse_log_level(&config.logging.level)?;
    Ok(())
}

fn validate_store_config(config: &AppConfig) -> Result<()> {
    match config.store.url() {
        Some(url) => bulwark_providers::store::validate_url(url),
        None => Ok(()),
    }
}

fn validate_cache_config(config: &AppConfig) -> Result<()> {
    if let Some(bad) = config
        .cache
        .namespace
        .chars()
        .find(|c| matches!(c, '*' | '?' | '[' | ']' | ':') || c.is_whitespace())
    {
        return Err(Error::configuration(format!(
            "Cache namespace '{}' contains reserved character '{bad}'",
            config.cache.namespace
        )));
    }
    if config.cache.default_ttl_secs == Some(0) {
        return Err(Error::configuration(
            "Cache default TTL cannot be 0; omit it for entries that never expire",
        ));
    }
    Ok(())
}

fn validate_rate_limit_config(config: &AppConfig) -> Result<()> {
    config.rate_limit.parsed_limits().map(|_| ())
}
