//! Configuration module for Gig-Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use gig_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("gig-crawler.toml")).unwrap();
//! println!("Slow loop runs every {}s", config.scheduler.slow_interval);
//! ```

mod parser;
mod types;
pub mod validation;

// Re-export types
pub use types::{
    Cadence, CodecConfig, Config, SchedulerConfig, SourceEntry, StorageConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, require_codec_key, resolve_codec_key,
};

/// Environment variable that overrides the `[codec] key` setting
pub const CODEC_KEY_ENV: &str = "GIG_CRAWLER_ID_KEY";
