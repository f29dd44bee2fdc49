//! Gig-Crawler: marketplace listing ingestion
//!
//! This crate polls several freelance/job marketplaces on independent cadences,
//! normalizes every listing into one record shape and persists only listings
//! whose source URL has not been seen before. Persisted records are exposed to
//! callers under an opaque, reversible public identifier.

pub mod codec;
pub mod config;
pub mod crawler;
pub mod ingest;
pub mod model;
pub mod output;
pub mod sources;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Gig-Crawler operations
#[derive(Debug, Error)]
pub enum GigError {
    #[error("Crawl error: {0}")]
    Crawl(#[from] sources::CrawlError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Unknown source platform: {0}")]
    UnknownSource(String),

    #[error("Invalid loop state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::LoopState,
        to: state::LoopState,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

// Re-export commonly used types
pub use codec::IdCodec;
pub use config::Config;
pub use crawler::{Coordinator, Scheduler};
pub use ingest::{ingest_batch, IngestOptions, IngestReport};
pub use model::{CandidateRecord, ListingStatus, PaymentType, PersistedRecord, WorkType};
pub use sources::{Source, SourceRegistry};
pub use storage::{SqliteStorage, Storage};
