//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::{CandidateRecord, ListingMetadata, ListingStatus, PersistedRecord};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable listing store
///
/// The listing URL is unique across all platforms. Writes go through an
/// [`IngestTransaction`] so a batch lands entirely or not at all; the read
/// methods see only committed data.
pub trait Storage: Send {
    /// Opens the write transaction for one ingest batch
    ///
    /// Dropping the returned transaction without calling
    /// [`IngestTransaction::commit`] rolls it back.
    fn begin_ingest(&mut self) -> StorageResult<Box<dyn IngestTransaction + '_>>;

    /// Gets a listing by row id
    fn get_listing(&self, id: i64) -> StorageResult<Option<PersistedRecord>>;

    /// Gets a listing by its canonical URL
    fn find_by_url(&self, url: &str) -> StorageResult<Option<PersistedRecord>>;

    /// Gets a listing by platform and marketplace-native id
    fn find_by_source_id(
        &self,
        platform: &str,
        source_id: &str,
    ) -> StorageResult<Option<PersistedRecord>>;

    /// All listings, newest posting first
    fn query_all(&self) -> StorageResult<Vec<PersistedRecord>>;

    /// Listings for one platform, newest posting first
    fn query_by_platform(&self, platform: &str) -> StorageResult<Vec<PersistedRecord>>;

    fn count_by_platform(&self, platform: &str) -> StorageResult<u64>;

    /// Listing count for every platform that has at least one listing
    fn platform_counts(&self) -> StorageResult<BTreeMap<String, u64>>;
}

/// One open ingest batch
pub trait IngestTransaction {
    /// Looks up a listing by URL, seeing this transaction's own writes
    fn find_by_url(&self, url: &str) -> StorageResult<Option<PersistedRecord>>;

    /// Inserts the given listings
    ///
    /// # Returns
    ///
    /// The number of rows inserted. A URL that already exists fails the call
    /// with [`StorageError::ConstraintViolation`].
    fn insert_all(&mut self, records: &[CandidateRecord]) -> StorageResult<usize>;

    /// Updates the mutable fields of an existing listing
    ///
    /// # Returns
    ///
    /// `true` if a row with `id` existed and was updated
    fn refresh_listing(
        &mut self,
        id: i64,
        status: ListingStatus,
        metadata: &ListingMetadata,
    ) -> StorageResult<bool>;

    /// Makes every write of this batch durable
    fn commit(self: Box<Self>) -> StorageResult<()>;
}
