//! Normalization and validation of crawled listings
use crate::model::{CandidateRecord, RawListing};
use crate::url::canonical_listing_key;
use std::collections::BTreeSet;
use thiserror::Error;

/// A single listing that cannot be used
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("budget minimum {min} exceeds maximum {max}")]
    InvalidBudget { min: f64, max: f64 },

    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),

    #[error("invalid listing URL: {0}")]
    InvalidUrl(String),
}

/// Turns a parser's draft into a validated [`CandidateRecord`]
///
/// Missing optional fields take their defaults (`active`, `undefined` work
/// type, `fixed` payment). Missing required fields reject the entry.
pub fn normalize(raw: RawListing) -> Result<CandidateRecord, ParseError> {
    let candidate = CandidateRecord {
        platform: raw.platform.ok_or(ParseError::MissingField("platform"))?,
        title: raw.title.ok_or(ParseError::MissingField("title"))?,
        description: raw.description,
        budget_min: raw.budget_min,
        budget_max: raw.budget_max,
        currency: raw.currency.ok_or(ParseError::MissingField("currency"))?,
        posted_date: raw.posted_date.ok_or(ParseError::MissingField("posted_date"))?,
        deadline: raw.deadline,
        skills: raw.skills.into_iter().collect(),
        url: raw.url.ok_or(ParseError::MissingField("url"))?,
        status: raw.status.unwrap_or_default(),
        work_type: raw.work_type.unwrap_or_default(),
        payment_type: raw.payment_type.unwrap_or_default(),
        metadata: raw.metadata,
    };
    validate(candidate)
}

/// Checks the record invariants and puts fields in canonical form
///
/// - `platform`, `title`, `url` are trimmed and must be non-empty
/// - `currency` must be three ASCII letters and is upper-cased
/// - a zero or negative budget bound means "not disclosed"
/// - `budget_min <= budget_max` when both are present
/// - skills are trimmed, blanks dropped, duplicates collapsed
/// - absolute URLs are canonicalized
pub fn validate(mut candidate: CandidateRecord) -> Result<CandidateRecord, ParseError> {
    candidate.platform = required(candidate.platform, "platform")?;
    candidate.title = required(candidate.title, "title")?;

    let url = required(candidate.url, "url")?;
    candidate.url =
        canonical_listing_key(&url).map_err(|e| ParseError::InvalidUrl(e.to_string()))?;

    let currency = candidate.currency.trim().to_ascii_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ParseError::InvalidCurrency(candidate.currency));
    }
    candidate.currency = currency;

    candidate.budget_min = candidate.budget_min.filter(|v| v.is_finite() && *v > 0.0);
    candidate.budget_max = candidate.budget_max.filter(|v| v.is_finite() && *v > 0.0);
    if let (Some(min), Some(max)) = (candidate.budget_min, candidate.budget_max) {
        if min > max {
            return Err(ParseError::InvalidBudget { min, max });
        }
    }

    candidate.description = candidate
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    candidate.skills = candidate
        .skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>();

    Ok(candidate)
}

fn required(value: String, field: &'static str) -> Result<String, ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ParseError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}
