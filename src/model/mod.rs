//! Listing data model
//!
//! - `CandidateRecord`: a crawled listing before the ingest decision
//! - `RawListing`: the optional-field draft parsers fill in
//! - `PersistedRecord`: a stored listing with row id and timestamps
//! - `PublicRecord`: a stored listing with its id replaced by a public token

mod kinds;
mod listing;
mod record;

pub use kinds::{ListingStatus, PaymentType, WorkType};
pub use listing::{CandidateRecord, ClientInfo, ListingMetadata, RawListing};
pub use record::{PersistedRecord, PublicRecord};

/// Minimal valid listing for unit tests
#[cfg(test)]
pub(crate) fn sample_candidate(platform: &str, url: &str, source_id: &str) -> CandidateRecord {
    use chrono::{TimeZone, Utc};

    CandidateRecord {
        platform: platform.to_string(),
        title: format!("Listing {}", source_id),
        description: Some("Build a thing".to_string()),
        budget_min: Some(100.0),
        budget_max: Some(500.0),
        currency: "USD".to_string(),
        posted_date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        deadline: None,
        skills: ["rust".to_string(), "sql".to_string()].into_iter().collect(),
        url: url.to_string(),
        status: ListingStatus::Active,
        work_type: WorkType::Remote,
        payment_type: PaymentType::Fixed,
        metadata: ListingMetadata::with_source_id(source_id),
    }
}
