//! Configuration validation module
//!
//! Startup validation: every failure here is fatal and reported as
//! `RelayError::Config`.

use crate::utils::errors::{RelayError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_proxy_config(&settings.proxy)?;
    validate_providers_config(&settings.providers)?;
    validate_storage_config(&settings.storage)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(RelayError::Config(
            "Bot token is required".to_string()
        ));
    }

    if config.dedupe_window_seconds == 0 {
        return Err(RelayError::Config(
            "Dedupe window must be greater than 0".to_string()
        ));
    }

    if let Some(channel) = config.required_channels.iter().find(|c| !c.starts_with('@')) {
        return Err(RelayError::Config(
            format!("Required channel must start with '@': {}", channel)
        ));
    }

    Ok(())
}

/// Validate SOCKS5 proxy configuration
fn validate_proxy_config(config: &super::ProxyConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(RelayError::Config(
            "Proxy host is required".to_string()
        ));
    }

    if config.port == 0 {
        return Err(RelayError::Config(
            "Proxy port must be greater than 0".to_string()
        ));
    }

    if config.username.is_empty() || config.password.is_empty() {
        return Err(RelayError::Config(
            "Proxy credentials are required".to_string()
        ));
    }

    Ok(())
}

/// Validate provider endpoints
fn validate_providers_config(config: &super::ProvidersConfig) -> Result<()> {
    if config.timeout_seconds == 0 {
        return Err(RelayError::Config(
            "Provider timeout must be greater than 0".to_string()
        ));
    }

    for (name, endpoint) in config.endpoints() {
        if endpoint.api_key.is_empty() {
            return Err(RelayError::Config(
                format!("API key for provider '{}' is required", name)
            ));
        }

        if endpoint.base_url.is_empty() {
            return Err(RelayError::Config(
                format!("Base URL for provider '{}' is required", name)
            ));
        }

        url::Url::parse(&endpoint.base_url).map_err(|e| RelayError::Config(
            format!("Invalid base URL for provider '{}': {}", name, e)
        ))?;
    }

    Ok(())
}

/// Validate storage configuration
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    if config.admin_config_path.is_empty() {
        return Err(RelayError::Config(
            "Admin config path is required".to_string()
        ));
    }

    if config.session_backend == super::SessionBackend::Redis && config.redis.url.is_empty() {
        return Err(RelayError::Config(
            "Redis URL is required for the redis session backend".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(RelayError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(RelayError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
