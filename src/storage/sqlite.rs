//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::model::{
    CandidateRecord, ListingMetadata, ListingStatus, PaymentType, PersistedRecord, WorkType,
};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{IngestTransaction, Storage, StorageError, StorageResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{
    params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

/// How long a writer waits for the other cadence loop's transaction
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const LISTING_COLUMNS: &str = "id, platform, title, description, budget_min, budget_max, \
    currency, posted_date, deadline, skills, url, status, work_type, payment_type, metadata, \
    created_at, updated_at";

/// SQLite storage backend
///
/// Each cadence loop opens its own `SqliteStorage` on the same file;
/// concurrent batches are serialized by SQLite's own locking.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Storage for SqliteStorage {
    fn begin_ingest(&mut self) -> StorageResult<Box<dyn IngestTransaction + '_>> {
        // Take the write lock up front so the existence checks and the inserts
        // see the same snapshot.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(Box::new(SqliteIngest { tx }))
    }

    fn get_listing(&self, id: i64) -> StorageResult<Option<PersistedRecord>> {
        select_one(&self.conn, "id = ?1", params![id])
    }

    fn find_by_url(&self, url: &str) -> StorageResult<Option<PersistedRecord>> {
        select_one(&self.conn, "url = ?1", params![url])
    }

    fn find_by_source_id(
        &self,
        platform: &str,
        source_id: &str,
    ) -> StorageResult<Option<PersistedRecord>> {
        select_one(
            &self.conn,
            "platform = ?1 AND source_id = ?2",
            params![platform, source_id],
        )
    }

    fn query_all(&self) -> StorageResult<Vec<PersistedRecord>> {
        let sql = format!(
            "SELECT {} FROM listings ORDER BY posted_date DESC, id DESC",
            LISTING_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn query_by_platform(&self, platform: &str) -> StorageResult<Vec<PersistedRecord>> {
        let sql = format!(
            "SELECT {} FROM listings WHERE platform = ?1 ORDER BY posted_date DESC, id DESC",
            LISTING_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![platform], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn count_by_platform(&self, platform: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM listings WHERE platform = ?1",
            params![platform],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn platform_counts(&self) -> StorageResult<BTreeMap<String, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT platform, COUNT(*) FROM listings GROUP BY platform")?;
        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(counts)
    }
}

/// Write transaction for one ingest batch
struct SqliteIngest<'conn> {
    tx: Transaction<'conn>,
}

impl IngestTransaction for SqliteIngest<'_> {
    fn find_by_url(&self, url: &str) -> StorageResult<Option<PersistedRecord>> {
        select_one(&self.tx, "url = ?1", params![url])
    }

    fn insert_all(&mut self, records: &[CandidateRecord]) -> StorageResult<usize> {
        let now = timestamp_string(&Utc::now());
        let mut stmt = self.tx.prepare_cached(
            "INSERT INTO listings (platform, source_id, title, description, budget_min,
                budget_max, currency, posted_date, deadline, skills, url, status, work_type,
                payment_type, metadata, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)",
        )?;

        let mut inserted = 0;
        for record in records {
            let skills = serde_json::to_string(&record.skills)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            let metadata = serde_json::to_string(&record.metadata)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;

            inserted += stmt
                .execute(params![
                    record.platform,
                    record.source_id(),
                    record.title,
                    record.description,
                    record.budget_min,
                    record.budget_max,
                    record.currency,
                    timestamp_string(&record.posted_date),
                    record.deadline.as_ref().map(timestamp_string),
                    skills,
                    record.url,
                    record.status.to_db_string(),
                    record.work_type.to_db_string(),
                    record.payment_type.to_db_string(),
                    metadata,
                    now,
                ])
                .map_err(classify_write_error)?;
        }

        Ok(inserted)
    }

    fn refresh_listing(
        &mut self,
        id: i64,
        status: ListingStatus,
        metadata: &ListingMetadata,
    ) -> StorageResult<bool> {
        let metadata = serde_json::to_string(metadata)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let changed = self
            .tx
            .execute(
                "UPDATE listings SET status = ?1, metadata = ?2, updated_at = ?3 WHERE id = ?4",
                params![
                    status.to_db_string(),
                    metadata,
                    timestamp_string(&Utc::now()),
                    id
                ],
            )
            .map_err(classify_write_error)?;
        Ok(changed > 0)
    }

    fn commit(self: Box<Self>) -> StorageResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

fn select_one(
    conn: &Connection,
    condition: &str,
    params: &[&dyn rusqlite::ToSql],
) -> StorageResult<Option<PersistedRecord>> {
    let sql = format!(
        "SELECT {} FROM listings WHERE {} LIMIT 1",
        LISTING_COLUMNS, condition
    );
    let record = conn.query_row(&sql, params, row_to_record).optional()?;
    Ok(record)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<PersistedRecord> {
    let skills: BTreeSet<String> = json_column(row, 9)?;
    let metadata: ListingMetadata = json_column(row, 14)?;

    Ok(PersistedRecord {
        id: row.get(0)?,
        listing: CandidateRecord {
            platform: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            budget_min: row.get(4)?,
            budget_max: row.get(5)?,
            currency: row.get(6)?,
            posted_date: timestamp_column(row, 7)?,
            deadline: optional_timestamp_column(row, 8)?,
            skills,
            url: row.get(10)?,
            status: enum_column(row, 11, ListingStatus::from_db_string)?,
            work_type: enum_column(row, 12, WorkType::from_db_string)?,
            payment_type: enum_column(row, 13, PaymentType::from_db_string)?,
            metadata,
        },
        created_at: timestamp_column(row, 15)?,
        updated_at: timestamp_column(row, 16)?,
    })
}

/// Fixed-width RFC 3339 so text ordering matches time ordering
fn timestamp_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(idx, &raw)
}

fn optional_timestamp_column(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_timestamp(idx, &s)).transpose()
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn enum_column<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown value '{}'", raw).into(),
        )
    })
}

fn classify_write_error(e: rusqlite::Error) -> StorageError {
    match &e {
        rusqlite::Error::SqliteFailure(err, msg) if err.code == ErrorCode::ConstraintViolation => {
            StorageError::ConstraintViolation(msg.clone().unwrap_or_else(|| err.to_string()))
        }
        _ => StorageError::Sqlite(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample_candidate;

    fn insert(storage: &mut SqliteStorage, records: &[CandidateRecord]) -> StorageResult<usize> {
        let mut tx = storage.begin_ingest()?;
        let count = tx.insert_all(records)?;
        tx.commit()?;
        Ok(count)
    }

    #[test]
    fn test_create_in_memory() {
        assert!(SqliteStorage::new_in_memory().is_ok());
    }

    #[test]
    fn test_insert_and_find_by_url() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let mut candidate = sample_candidate("guru", "https://www.guru.com/work/detail/1", "1");
        candidate.metadata.category = Some("Programming".to_string());
        candidate.metadata.insert_extra("verified", true);

        assert_eq!(insert(&mut storage, &[candidate.clone()]).unwrap(), 1);

        let stored = storage
            .find_by_url("https://www.guru.com/work/detail/1")
            .unwrap()
            .unwrap();
        assert!(stored.id > 0);
        assert_eq!(stored.listing, candidate);
        assert_eq!(stored.created_at, stored.updated_at);

        assert!(storage.find_by_url("https://nowhere/").unwrap().is_none());
        assert_eq!(storage.get_listing(stored.id).unwrap().unwrap().id, stored.id);
    }

    #[test]
    fn test_duplicate_url_is_constraint_violation() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let first = sample_candidate("guru", "a.com/1", "1");
        let second = sample_candidate("upwork", "a.com/1", "2");

        insert(&mut storage, &[first]).unwrap();
        let result = insert(&mut storage, &[second]);
        assert!(matches!(result, Err(StorageError::ConstraintViolation(_))));
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        {
            let mut tx = storage.begin_ingest().unwrap();
            tx.insert_all(&[sample_candidate("guru", "a.com/1", "1")])
                .unwrap();
            assert!(tx.find_by_url("a.com/1").unwrap().is_some());
        }
        assert!(storage.find_by_url("a.com/1").unwrap().is_none());
        assert_eq!(storage.count_by_platform("guru").unwrap(), 0);
    }

    #[test]
    fn test_refresh_listing() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        insert(&mut storage, &[sample_candidate("wishket", "a.com/1", "1")]).unwrap();
        let stored = storage.find_by_url("a.com/1").unwrap().unwrap();

        let mut metadata = stored.listing.metadata.clone();
        metadata.applicants = Some(12);

        let mut tx = storage.begin_ingest().unwrap();
        assert!(tx
            .refresh_listing(stored.id, ListingStatus::Closed, &metadata)
            .unwrap());
        assert!(!tx
            .refresh_listing(stored.id + 100, ListingStatus::Closed, &metadata)
            .unwrap());
        tx.commit().unwrap();

        let refreshed = storage.get_listing(stored.id).unwrap().unwrap();
        assert_eq!(refreshed.listing.status, ListingStatus::Closed);
        assert_eq!(refreshed.listing.metadata.applicants, Some(12));
        assert!(refreshed.updated_at >= stored.updated_at);
        assert_eq!(refreshed.created_at, stored.created_at);
    }

    #[test]
    fn test_queries_by_platform() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        insert(
            &mut storage,
            &[
                sample_candidate("guru", "a.com/1", "1"),
                sample_candidate("guru", "a.com/2", "2"),
                sample_candidate("upwork", "a.com/3", "3"),
            ],
        )
        .unwrap();

        assert_eq!(storage.query_all().unwrap().len(), 3);
        assert_eq!(storage.query_by_platform("guru").unwrap().len(), 2);
        assert_eq!(storage.count_by_platform("upwork").unwrap(), 1);
        assert_eq!(storage.count_by_platform("fiverr").unwrap(), 0);

        let counts = storage.platform_counts().unwrap();
        assert_eq!(counts.get("guru"), Some(&2));
        assert_eq!(counts.get("upwork"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_find_by_source_id() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        insert(&mut storage, &[sample_candidate("freemoa", "a.com/1", "31512")]).unwrap();

        let found = storage.find_by_source_id("freemoa", "31512").unwrap();
        assert_eq!(found.unwrap().listing.url, "a.com/1");
        assert!(storage.find_by_source_id("guru", "31512").unwrap().is_none());
    }

    #[test]
    fn test_query_all_newest_first() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let older = sample_candidate("guru", "a.com/1", "1");
        let mut newer = sample_candidate("guru", "a.com/2", "2");
        newer.posted_date = older.posted_date + chrono::Duration::hours(3);
        insert(&mut storage, &[older, newer]).unwrap();

        let urls: Vec<_> = storage
            .query_all()
            .unwrap()
            .into_iter()
            .map(|r| r.listing.url)
            .collect();
        assert_eq!(urls, vec!["a.com/2".to_string(), "a.com/1".to_string()]);
    }

    #[test]
    fn test_file_backed_storage_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gigs.db");
        {
            let mut storage = SqliteStorage::new(&path).unwrap();
            insert(&mut storage, &[sample_candidate("guru", "a.com/1", "1")]).unwrap();
        }
        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.count_by_platform("guru").unwrap(), 1);
    }
}
