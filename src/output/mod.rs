//! Output module for the read side
//!
//! This module handles:
//! - Listing statistics per platform
//! - Exporting stored listings under their public identifiers
//! - Resolving a public identifier back to a marketplace URL

mod export;
pub mod stats;

pub use export::{export_listings, resolve_listing_url, write_listings};
pub use stats::{load_statistics, print_statistics, ListingStatistics};

use crate::codec::CodecError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Identifier error: {0}")]
    Codec(#[from] CodecError),

    #[error("Unknown source platform: {0}")]
    UnknownSource(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
