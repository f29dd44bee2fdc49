//! Listing records as produced by source adapters
use crate::model::kinds::{ListingStatus, PaymentType, WorkType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A freshly crawled listing that has not been persisted yet
///
/// `url` is the natural key: two candidates with the same URL are the same
/// listing regardless of which platform produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub platform: String,
    pub title: String,
    pub description: Option<String>,
    /// Lower bound of the budget; `None` means not disclosed
    pub budget_min: Option<f64>,
    /// Upper bound of the budget; `None` means not disclosed
    pub budget_max: Option<f64>,
    /// Three-letter currency code, upper-case
    pub currency: String,
    pub posted_date: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub skills: BTreeSet<String>,
    pub url: String,
    pub status: ListingStatus,
    pub work_type: WorkType,
    pub payment_type: PaymentType,
    pub metadata: ListingMetadata,
}

impl CandidateRecord {
    /// The marketplace's own identifier for this listing, if one was scraped
    pub fn source_id(&self) -> Option<&str> {
        self.metadata
            .source_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Platform-specific extras carried alongside the core fields
///
/// The well-known keys are typed. Anything else a parser wants to keep goes
/// into `extras`, which is flattened into the same JSON object on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingMetadata {
    /// Marketplace-native project id
    #[serde(rename = "project_id", default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicants: Option<u32>,
    /// Budget exactly as shown on the site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    /// Expected duration as shown on the site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientInfo>,
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,
}

impl ListingMetadata {
    pub fn with_source_id(id: impl Into<String>) -> Self {
        Self {
            source_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Stores an extra key, ignoring keys that shadow a typed field
    pub fn insert_extra(&mut self, key: &str, value: impl Into<Value>) {
        const RESERVED: &[&str] = &[
            "project_id",
            "category",
            "location",
            "applicants",
            "budget_text",
            "project_type",
            "term",
            "client",
        ];
        if !RESERVED.contains(&key) {
            self.extras.insert(key.to_string(), value.into());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// A listing as a parser sees it: every field may be missing
///
/// Parsers fill this field by field and hand it to
/// [`crate::ingest::normalize`], which decides whether the entry is usable.
#[derive(Debug, Clone, Default)]
pub struct RawListing {
    pub platform: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub currency: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub skills: Vec<String>,
    pub url: Option<String>,
    pub status: Option<ListingStatus>,
    pub work_type: Option<WorkType>,
    pub payment_type: Option<PaymentType>,
    pub metadata: ListingMetadata,
}

impl RawListing {
    pub fn new(platform: &str) -> Self {
        Self {
            platform: Some(platform.to_string()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_serializes_flat() {
        let mut meta = ListingMetadata::with_source_id("142399");
        meta.category = Some("development".to_string());
        meta.insert_extra("verified", true);

        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            value,
            json!({"project_id": "142399", "category": "development", "verified": true})
        );
    }

    #[test]
    fn test_metadata_unknown_keys_land_in_extras() {
        let meta: ListingMetadata =
            serde_json::from_value(json!({"project_id": "7", "proposals": "10 to 15"})).unwrap();
        assert_eq!(meta.source_id.as_deref(), Some("7"));
        assert_eq!(meta.extras.get("proposals"), Some(&json!("10 to 15")));
    }

    #[test]
    fn test_reserved_extra_keys_ignored() {
        let mut meta = ListingMetadata::default();
        meta.insert_extra("project_id", "shadow");
        assert!(meta.extras.is_empty());
        assert!(meta.source_id.is_none());
    }
}
