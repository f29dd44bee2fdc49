//! Ingest against real SQLite stores

use crate::common::candidate;
use gig_crawler::ingest::{ingest_batch, IngestOptions};
use gig_crawler::model::{CandidateRecord, ListingMetadata, ListingStatus, PersistedRecord};
use gig_crawler::storage::{
    open_storage, IngestTransaction, SqliteStorage, Storage, StorageError, StorageResult,
};
use std::collections::BTreeMap;

/// Delegates everything but fails every batch after the inserts ran
pub(crate) struct FailingCommit {
    pub(crate) inner: SqliteStorage,
}

struct FailingTransaction<'a> {
    inner: Box<dyn IngestTransaction + 'a>,
}

impl IngestTransaction for FailingTransaction<'_> {
    fn find_by_url(&self, url: &str) -> StorageResult<Option<PersistedRecord>> {
        self.inner.find_by_url(url)
    }

    fn insert_all(&mut self, records: &[CandidateRecord]) -> StorageResult<usize> {
        self.inner.insert_all(records)?;
        Err(StorageError::ConstraintViolation("injected failure".to_string()))
    }

    fn refresh_listing(
        &mut self,
        id: i64,
        status: ListingStatus,
        metadata: &ListingMetadata,
    ) -> StorageResult<bool> {
        self.inner.refresh_listing(id, status, metadata)
    }

    fn commit(self: Box<Self>) -> StorageResult<()> {
        self.inner.commit()
    }
}

impl Storage for FailingCommit {
    fn begin_ingest(&mut self) -> StorageResult<Box<dyn IngestTransaction + '_>> {
        let inner = self.inner.begin_ingest()?;
        Ok(Box::new(FailingTransaction { inner }))
    }

    fn get_listing(&self, id: i64) -> StorageResult<Option<PersistedRecord>> {
        self.inner.get_listing(id)
    }

    fn find_by_url(&self, url: &str) -> StorageResult<Option<PersistedRecord>> {
        self.inner.find_by_url(url)
    }

    fn find_by_source_id(
        &self,
        platform: &str,
        source_id: &str,
    ) -> StorageResult<Option<PersistedRecord>> {
        self.inner.find_by_source_id(platform, source_id)
    }

    fn query_all(&self) -> StorageResult<Vec<PersistedRecord>> {
        self.inner.query_all()
    }

    fn query_by_platform(&self, platform: &str) -> StorageResult<Vec<PersistedRecord>> {
        self.inner.query_by_platform(platform)
    }

    fn count_by_platform(&self, platform: &str) -> StorageResult<u64> {
        self.inner.count_by_platform(platform)
    }

    fn platform_counts(&self) -> StorageResult<BTreeMap<String, u64>> {
        self.inner.platform_counts()
    }
}

#[test]
fn test_storage_failure_rolls_back_whole_batch() {
    let mut store = FailingCommit {
        inner: SqliteStorage::new_in_memory().unwrap(),
    };
    let batch = vec![
        candidate("guru", "https://www.guru.com/work/detail/1", "1"),
        candidate("guru", "https://www.guru.com/work/detail/2", "2"),
        candidate("guru", "https://www.guru.com/work/detail/3", "3"),
    ];

    let result = ingest_batch(&mut store, batch, IngestOptions::default());
    assert!(matches!(result, Err(StorageError::ConstraintViolation(_))));
    assert!(store.query_all().unwrap().is_empty());
    assert_eq!(store.count_by_platform("guru").unwrap(), 0);
}

#[test]
fn test_existing_url_and_new_url() {
    let mut store = SqliteStorage::new_in_memory().unwrap();
    ingest_batch(
        &mut store,
        vec![candidate("guru", "a.com/1", "1")],
        IngestOptions::default(),
    )
    .unwrap();

    let report = ingest_batch(
        &mut store,
        vec![candidate("guru", "a.com/1", "1"), candidate("guru", "a.com/2", "2")],
        IngestOptions::default(),
    )
    .unwrap();
    assert_eq!(report.inserted, 1);
    assert!(store.find_by_url("a.com/2").unwrap().is_some());
    assert_eq!(store.query_all().unwrap().len(), 2);
}

#[test]
fn test_malformed_candidate_is_isolated() {
    let mut store = SqliteStorage::new_in_memory().unwrap();
    let mut missing_url = candidate("wishket", "", "9");
    missing_url.url = "   ".to_string();
    let mut inverted = candidate("wishket", "https://www.wishket.com/project/8", "8");
    inverted.budget_min = Some(900.0);
    inverted.budget_max = Some(100.0);

    let batch = vec![
        candidate("wishket", "https://www.wishket.com/project/1", "1"),
        missing_url,
        inverted,
        candidate("wishket", "https://www.wishket.com/project/2", "2"),
    ];

    let report = ingest_batch(&mut store, batch, IngestOptions::default()).unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(report.rejected, 2);
    assert_eq!(store.count_by_platform("wishket").unwrap(), 2);
}

#[test]
fn test_cross_platform_url_is_one_key() {
    let mut store = SqliteStorage::new_in_memory().unwrap();
    let batch = vec![
        candidate("freelancer", "https://jobs.example.com/42", "42"),
        candidate("guru", "https://jobs.example.com/42", "g42"),
    ];

    let report = ingest_batch(&mut store, batch, IngestOptions::default()).unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(report.duplicates, 1);

    let stored = store.find_by_url("https://jobs.example.com/42").unwrap().unwrap();
    assert_eq!(stored.listing.platform, "freelancer");
}

#[test]
fn test_tracking_params_do_not_defeat_dedup() {
    let mut store = SqliteStorage::new_in_memory().unwrap();
    let batch = vec![candidate(
        "guru",
        "https://www.guru.com/work/detail/7?utm_source=mail",
        "7",
    )];
    ingest_batch(&mut store, batch, IngestOptions::default()).unwrap();

    let again = vec![candidate("guru", "https://WWW.guru.com/work/detail/7/#apply", "7")];
    let report = ingest_batch(&mut store, again, IngestOptions::default()).unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(report.duplicates, 1);
}

#[test]
fn test_refresh_updates_status_only_when_enabled() {
    let mut store = SqliteStorage::new_in_memory().unwrap();
    let url = "https://www.wishket.com/project/5";
    ingest_batch(
        &mut store,
        vec![candidate("wishket", url, "5")],
        IngestOptions::default(),
    )
    .unwrap();

    let mut closed = candidate("wishket", url, "5");
    closed.status = ListingStatus::Closed;

    let report = ingest_batch(&mut store, vec![closed.clone()], IngestOptions::default()).unwrap();
    assert_eq!(report.refreshed, 0);
    assert_eq!(
        store.find_by_url(url).unwrap().unwrap().listing.status,
        ListingStatus::Active
    );

    let refresh = IngestOptions {
        refresh_existing: true,
    };
    let report = ingest_batch(&mut store, vec![closed], refresh).unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(report.refreshed, 1);
    assert_eq!(
        store.find_by_url(url).unwrap().unwrap().listing.status,
        ListingStatus::Closed
    );
}

#[test]
fn test_two_connections_share_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("listings.db");
    let mut fast = open_storage(&path).unwrap();
    let mut slow = open_storage(&path).unwrap();

    ingest_batch(
        &mut fast,
        vec![candidate("upwork", "https://www.upwork.com/jobs/~01", "~01")],
        IngestOptions::default(),
    )
    .unwrap();
    let report = ingest_batch(
        &mut slow,
        vec![
            candidate("guru", "https://www.upwork.com/jobs/~01", "1"),
            candidate("guru", "https://www.guru.com/work/detail/1", "1"),
        ],
        IngestOptions::default(),
    )
    .unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(fast.query_all().unwrap().len(), 2);
    assert!(fast.find_by_source_id("guru", "1").unwrap().is_some());
}
