use crate::config::types::{
    CodecConfig, Config, SchedulerConfig, SourceEntry, StorageConfig, UserAgentConfig,
};
use crate::sources::SUPPORTED_PLATFORMS;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Largest per-cycle entry target accepted for a source
const MAX_TARGET_COUNT: usize = 500;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scheduler_config(&config.scheduler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    validate_codec_config(&config.codec)?;
    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates cadence intervals
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.fast_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "fast-interval must be >= 1s, got {}s",
            config.fast_interval
        )));
    }

    if config.slow_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "slow-interval must be >= 1s, got {}s",
            config.slow_interval
        )));
    }

    if config.fast_interval > config.slow_interval {
        return Err(ConfigError::Validation(format!(
            "fast-interval ({}s) must not exceed slow-interval ({}s)",
            config.fast_interval, config.slow_interval
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_codec_config(config: &CodecConfig) -> Result<(), ConfigError> {
    if let Some(key) = &config.key {
        let bytes = hex::decode(key.trim())
            .map_err(|e| ConfigError::Validation(format!("codec key is not valid hex: {}", e)))?;
        if bytes.len() != 32 {
            return Err(ConfigError::Validation(format!(
                "codec key must be 64 hex characters (32 bytes), got {} bytes",
                bytes.len()
            )));
        }
    }
    Ok(())
}

/// Validates source entries
fn validate_sources(sources: &[SourceEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in sources {
        if !SUPPORTED_PLATFORMS.contains(&entry.platform.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Unsupported platform '{}' (expected one of: {})",
                entry.platform,
                SUPPORTED_PLATFORMS.join(", ")
            )));
        }

        if !seen.insert(entry.platform.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Platform '{}' is configured more than once",
                entry.platform
            )));
        }

        let url = Url::parse(&entry.base_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", entry.base_url, e))
        })?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "base-url '{}' must use HTTP or HTTPS",
                entry.base_url
            )));
        }

        if entry.target_count < 1 || entry.target_count > MAX_TARGET_COUNT {
            return Err(ConfigError::Validation(format!(
                "target-count for '{}' must be between 1 and {}, got {}",
                entry.platform, MAX_TARGET_COUNT, entry.target_count
            )));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
