//! HTML listing pages
//!
//! Every supported marketplace serves a page of listing cards. The generic
//! [`HtmlListingSource`] fetches that page and hands each card to a
//! site-specific [`ListingParser`]. The helpers below are the field
//! extractors the parsers share; each returns `None` instead of failing.

use crate::ingest::normalize;
use crate::model::{CandidateRecord, RawListing};
use crate::sources::{fetch_page, CrawlError, Source};
use crate::url::canonicalize_url;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use url::Url;

/// Inputs a parser needs besides the card itself
pub struct ParseContext<'a> {
    /// Page URL, for resolving relative links
    pub base_url: &'a Url,
    /// Reference time for relative ages like "3 hours ago"
    pub now: DateTime<Utc>,
}

/// Site-specific extraction of listing cards
pub trait ListingParser: Send + Sync {
    /// Platform name stamped on every record
    fn platform(&self) -> &'static str;

    /// CSS selector matching one listing card
    fn entry_selector(&self) -> &'static str;

    /// Fills a draft listing from one card
    ///
    /// Returns `None` when the card lacks something no default can replace
    /// (typically the link or the id).
    fn parse_entry(&self, entry: ElementRef<'_>, ctx: &ParseContext<'_>) -> Option<RawListing>;

    /// Site-relative path of the listing page for a native id
    fn listing_path(&self, source_id: &str) -> String;
}

/// A [`Source`] backed by one HTML listing page
pub struct HtmlListingSource<P> {
    parser: P,
    base_url: Url,
    client: Client,
    target_count: usize,
}

impl<P: ListingParser> HtmlListingSource<P> {
    pub fn new(parser: P, base_url: Url, client: Client, target_count: usize) -> Self {
        Self {
            parser,
            base_url,
            client,
            target_count,
        }
    }

    /// Extracts up to `target_count` listings from a fetched page
    ///
    /// Malformed cards are skipped and counted; they never fail the page.
    pub fn parse_page(
        &self,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<CandidateRecord>, CrawlError> {
        let document = Html::parse_document(body);
        let selector = Selector::parse(self.parser.entry_selector()).map_err(|e| CrawlError::Body {
            url: self.base_url.to_string(),
            message: format!("invalid entry selector: {}", e),
        })?;

        let ctx = ParseContext {
            base_url: &self.base_url,
            now,
        };

        let mut records = Vec::new();
        let mut cards = 0;
        let mut malformed = 0;

        for entry in document.select(&selector) {
            if records.len() >= self.target_count {
                break;
            }
            cards += 1;

            let parsed = self
                .parser
                .parse_entry(entry, &ctx)
                .and_then(|raw| match normalize(raw) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        debug!("{}: skipping card: {}", self.parser.platform(), e);
                        None
                    }
                });

            match parsed {
                Some(record) => records.push(record),
                None => malformed += 1,
            }
        }

        info!(
            "{}: parsed {} of {} cards ({} malformed)",
            self.parser.platform(),
            records.len(),
            cards,
            malformed
        );
        Ok(records)
    }
}

#[async_trait]
impl<P: ListingParser + 'static> Source for HtmlListingSource<P> {
    fn name(&self) -> &str {
        self.parser.platform()
    }

    async fn crawl(&self) -> Result<Vec<CandidateRecord>, CrawlError> {
        let body = fetch_page(&self.client, self.base_url.as_str()).await?;
        self.parse_page(&body, Utc::now())
    }

    fn canonical_url(&self, source_id: &str) -> Option<String> {
        let source_id = source_id.trim();
        if source_id.is_empty() {
            return None;
        }
        let url = self.base_url.join(&self.parser.listing_path(source_id)).ok()?;
        canonicalize_url(url.as_str()).ok().map(String::from)
    }
}

// ===== Field extractors =====

/// Text of the first match, whitespace collapsed
pub fn select_text(entry: ElementRef<'_>, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    entry
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

/// Text of every match, empty ones dropped
pub fn select_all_text(entry: ElementRef<'_>, css: &str) -> Vec<String> {
    match Selector::parse(css) {
        Ok(selector) => entry
            .select(&selector)
            .map(element_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Attribute of the first match
pub fn select_attr(entry: ElementRef<'_>, css: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    entry
        .select(&selector)
        .find_map(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves a card link against the page URL
///
/// Returns None for `javascript:`, `mailto:`, `tel:`, `data:`, fragment-only
/// and non-HTTP(S) links.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Some(absolute.to_string())
    } else {
        None
    }
}

/// Parses one amount such as `1,200`, `$1.5k` or `40.00`
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let lower = cleaned.to_ascii_lowercase();

    let (number, multiplier) = match lower.strip_suffix('k') {
        Some(n) => (n, 1_000.0),
        None => (lower.as_str(), 1.0),
    };
    number.parse::<f64>().ok().map(|n| n * multiplier)
}

/// Every `$`-prefixed amount in `text`, in order
///
/// `"$500-$1k"` yields `[500.0, 1000.0]`.
pub fn dollar_amounts(text: &str) -> Vec<f64> {
    let mut amounts = Vec::new();
    let mut rest = text;

    while let Some(pos) = rest.find('$') {
        rest = &rest[pos + 1..];
        let token: String = rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.' || *c == 'k' || *c == 'K')
            .collect();
        if let Some(amount) = parse_amount(token.trim_end_matches('.')) {
            amounts.push(amount);
        }
        rest = &rest[token.len()..];
    }

    amounts
}

/// Parses a KRW budget written in units of 10,000 won
///
/// `"500만원 ~ 1,000만원"` yields `(5_000_000, 10_000_000)`; a single amount
/// fills both bounds.
pub fn parse_krw_range(text: &str) -> (Option<f64>, Option<f64>) {
    const MAN_WON: f64 = 10_000.0;

    let parse = |part: &str| -> Option<f64> {
        let digits: String = part
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        digits.parse::<f64>().ok().map(|n| n * MAN_WON)
    };

    match text.split_once('~') {
        Some((min, max)) => (parse(min), parse(max)),
        None => {
            let amount = parse(text);
            (amount, amount)
        }
    }
}

/// Converts "27 mins ago", "3 hours ago", "2 days ago" and the like to a time
///
/// "an hour ago" counts as one unit. Amounts too large to place on the
/// calendar yield `None`.
pub fn parse_relative_age(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lower = text.to_lowercase();
    if lower.contains("just now") || lower.contains("moments ago") {
        return Some(now);
    }
    if lower.contains("yesterday") {
        return now.checked_sub_signed(Duration::try_days(1)?);
    }

    let n = if lower.chars().any(|c| c.is_ascii_digit()) {
        i64::from(first_number(&lower)?)
    } else {
        1
    };
    let age = if lower.contains("min") {
        Duration::try_minutes(n)
    } else if lower.contains("hour") || lower.contains("hr") {
        Duration::try_hours(n)
    } else if lower.contains("day") {
        Duration::try_days(n)
    } else if lower.contains("week") {
        Duration::try_weeks(n)
    } else if lower.contains("month") {
        n.checked_mul(30).and_then(Duration::try_days)
    } else {
        return None;
    };
    now.checked_sub_signed(age?)
}

/// Converts "D-5" or "6 days left" to a deadline
pub fn parse_days_left(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lower = text.to_lowercase();
    if lower.contains("d-") || lower.contains("left") {
        let days = first_number(&lower)?;
        return now.checked_add_signed(Duration::try_days(i64::from(days))?);
    }
    None
}

/// First run of ASCII digits in `text` (commas inside the run are skipped)
pub fn first_number(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
