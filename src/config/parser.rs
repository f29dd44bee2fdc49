use crate::config::types::Config;
use crate::config::validation::validate;
use crate::config::CODEC_KEY_ENV;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a running process can be matched to the file it was
/// started with.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Picks the identifier key to use for this process
///
/// The environment variable wins over the file. `None` means a fresh key
/// should be generated at boot.
pub fn resolve_codec_key(config: &Config) -> Option<String> {
    std::env::var(CODEC_KEY_ENV)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| config.codec.key.clone())
}

/// Like [`resolve_codec_key`], but fails when no key is configured
///
/// Decoding a public identifier only works under the key that issued it, and
/// a key generated at boot never matches one from an earlier run.
pub fn require_codec_key(config: &Config) -> Result<String, ConfigError> {
    resolve_codec_key(config).ok_or_else(|| {
        ConfigError::Validation(format!(
            "no identifier key configured; set [codec] key or {} to the key \
             that issued the identifier",
            CODEC_KEY_ENV
        ))
    })
}
