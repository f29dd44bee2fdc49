//! Stored listings and their public view
use crate::codec::{CodecError, IdCodec};
use crate::model::kinds::{ListingStatus, PaymentType, WorkType};
use crate::model::listing::{CandidateRecord, ListingMetadata};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

/// A listing that has been written to the store
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRecord {
    pub id: i64,
    pub listing: CandidateRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PersistedRecord {
    pub fn source_id(&self) -> Option<&str> {
        self.listing.source_id()
    }
}

/// The externally visible form of a [`PersistedRecord`]
///
/// The row id never leaves the process; `id` is the encrypted source-native
/// id instead.
#[derive(Debug, Clone, Serialize)]
pub struct PublicRecord {
    pub id: String,
    pub platform: String,
    pub title: String,
    pub description: Option<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub currency: String,
    pub posted_date: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub skills: BTreeSet<String>,
    pub url: String,
    pub status: ListingStatus,
    pub work_type: WorkType,
    pub payment_type: PaymentType,
    pub metadata: ListingMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PublicRecord {
    /// Builds the public view, encrypting the source-native id
    ///
    /// Fails with [`CodecError::InvalidInput`] when the record carries no
    /// source-native id.
    pub fn from_record(record: &PersistedRecord, codec: &IdCodec) -> Result<Self, CodecError> {
        let id = codec.encode(record.source_id().unwrap_or_default())?;
        let listing = record.listing.clone();
        Ok(Self {
            id,
            platform: listing.platform,
            title: listing.title,
            description: listing.description,
            budget_min: listing.budget_min,
            budget_max: listing.budget_max,
            currency: listing.currency,
            posted_date: listing.posted_date,
            deadline: listing.deadline,
            skills: listing.skills,
            url: listing.url,
            status: listing.status,
            work_type: listing.work_type,
            payment_type: listing.payment_type,
            metadata: listing.metadata,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}
