//! Deduplicating, batch-atomic ingest
//!
//! One crawl cycle's candidates are checked against the store by URL and the
//! unseen ones are inserted in a single transaction. A bad candidate is
//! dropped on its own; a storage failure drops the whole batch.

pub mod normalize;

pub use normalize::{normalize, validate, ParseError};

use crate::model::CandidateRecord;
use crate::storage::{Storage, StorageResult};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Ingest behavior switches
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Update status and metadata of listings that are already stored
    pub refresh_existing: bool,
}

/// Outcome of one ingest batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// New listings written
    pub inserted: usize,
    /// Existing listings whose mutable fields were updated
    pub refreshed: usize,
    /// Candidates whose URL was already stored or already seen in this batch
    pub duplicates: usize,
    /// Candidates that failed validation
    pub rejected: usize,
    /// Candidates without a marketplace-native id
    pub unidentified: usize,
}

impl IngestReport {
    pub fn merge(&mut self, other: &IngestReport) {
        self.inserted += other.inserted;
        self.refreshed += other.refreshed;
        self.duplicates += other.duplicates;
        self.rejected += other.rejected;
        self.unidentified += other.unidentified;
    }
}

/// Persists the candidates of one crawl that are not already stored
///
/// # Arguments
///
/// * `store` - The listing store
/// * `candidates` - Everything one source returned in one cycle
/// * `options` - Whether existing rows are refreshed
///
/// # Returns
///
/// * `Ok(IngestReport)` - The batch committed; `inserted` is the count of new listings
/// * `Err(StorageError)` - The batch was rolled back and nothing was written
pub fn ingest_batch<S>(
    store: &mut S,
    candidates: Vec<CandidateRecord>,
    options: IngestOptions,
) -> StorageResult<IngestReport>
where
    S: Storage + ?Sized,
{
    let mut report = IngestReport::default();
    let mut tx = store.begin_ingest()?;
    let mut seen = HashSet::new();
    let mut staged = Vec::new();

    for candidate in candidates {
        let candidate = match validate(candidate) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("Dropping invalid listing: {}", e);
                report.rejected += 1;
                continue;
            }
        };

        if candidate.source_id().is_none() {
            debug!(
                "Dropping {} listing without a project id: {}",
                candidate.platform, candidate.url
            );
            report.unidentified += 1;
            continue;
        }

        if !seen.insert(candidate.url.clone()) {
            report.duplicates += 1;
            continue;
        }

        match tx.find_by_url(&candidate.url)? {
            None => staged.push(candidate),
            Some(existing) => {
                report.duplicates += 1;
                let changed = existing.listing.status != candidate.status
                    || existing.listing.metadata != candidate.metadata;
                if options.refresh_existing
                    && changed
                    && tx.refresh_listing(existing.id, candidate.status, &candidate.metadata)?
                {
                    report.refreshed += 1;
                }
            }
        }
    }

    report.inserted = tx.insert_all(&staged)?;
    tx.commit()?;

    if report.inserted > 0 || report.refreshed > 0 {
        info!(
            "Ingested {} new listings ({} refreshed, {} duplicates, {} rejected)",
            report.inserted, report.refreshed, report.duplicates, report.rejected
        );
    } else {
        debug!("No new listings ({} duplicates)", report.duplicates);
    }

    Ok(report)
}
