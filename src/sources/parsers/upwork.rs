use crate::model::{ClientInfo, PaymentType, RawListing, WorkType};
use crate::sources::html::{
    dollar_amounts, parse_relative_age, resolve_link, select_all_text, select_attr, select_text,
    ParseContext,
};
use crate::sources::ListingParser;
use scraper::ElementRef;

/// upwork.com job search results
pub struct UpworkParser;

impl ListingParser for UpworkParser {
    fn platform(&self) -> &'static str {
        "upwork"
    }

    fn entry_selector(&self) -> &'static str {
        ".job-tile"
    }

    fn parse_entry(&self, card: ElementRef<'_>, ctx: &ParseContext<'_>) -> Option<RawListing> {
        let href = select_attr(card, "a.job-title-link", "href")?;
        let url = resolve_link(&href, ctx.base_url)?;
        let job_id = job_id(&href)?;

        let mut raw = RawListing::new(self.platform());
        raw.title =
            select_text(card, "h4.job-title").or_else(|| select_text(card, "a.job-title-link"));
        raw.url = Some(url);
        raw.description = select_text(card, ".job-description");
        raw.currency = Some("USD".to_string());
        raw.work_type = Some(WorkType::Remote);
        raw.skills = select_all_text(card, ".skill-tag");
        raw.posted_date = select_text(card, ".job-posted-time")
            .and_then(|t| parse_relative_age(&t, ctx.now))
            .or(Some(ctx.now));

        let payment_terms = select_text(card, ".job-type");
        let budget_text = select_text(card, ".js-budget");
        let hourly = [&payment_terms, &budget_text]
            .into_iter()
            .flatten()
            .any(|t| t.to_lowercase().contains("hourly") || t.contains("/hr"));
        raw.payment_type = Some(if hourly {
            PaymentType::Hourly
        } else {
            PaymentType::Fixed
        });

        if let Some(text) = &budget_text {
            let amounts = dollar_amounts(text);
            (raw.budget_min, raw.budget_max) = match amounts.as_slice() {
                [] => (None, None),
                [single] => (Some(*single), Some(*single)),
                [min, max, ..] => (Some(*min), Some(*max)),
            };
        }

        let meta = &mut raw.metadata;
        meta.source_id = Some(job_id);
        meta.category = select_text(card, ".job-category");
        meta.budget_text = budget_text;
        meta.term = select_text(card, ".job-duration");
        meta.project_type = Some("remote".to_string());
        meta.location = select_text(card, ".client-location");
        let client_rating = select_text(card, ".client-rating").and_then(|t| t.parse::<f64>().ok());
        if client_rating.is_some() {
            meta.client = Some(ClientInfo {
                name: None,
                rating: client_rating,
            });
        }
        if let Some(terms) = payment_terms {
            meta.insert_extra("payment_terms", terms);
        }
        if let Some(level) = select_text(card, ".contractor-tier") {
            meta.insert_extra("experience_level", level);
        }

        Some(raw)
    }

    fn listing_path(&self, source_id: &str) -> String {
        format!("/jobs/{}", source_id)
    }
}

/// `/jobs/Build-API_~01ab23cd/` -> `~01ab23cd`
fn job_id(href: &str) -> Option<String> {
    let path = href.split(&['?', '#'][..]).next()?;
    if !path.contains("/jobs/") {
        return None;
    }
    let segment = path.split('/').rev().find(|s| s.contains('~'))?;
    let id = &segment[segment.find('~')?..];
    (id.len() > 1 && id[1..].chars().all(|c| c.is_ascii_alphanumeric())).then(|| id.to_string())
}
