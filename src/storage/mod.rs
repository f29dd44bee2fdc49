//! Storage module for persisting listings
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Batch-atomic listing ingest
//! - Read access for reporting

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{IngestTransaction, Storage, StorageError, StorageResult};

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}
