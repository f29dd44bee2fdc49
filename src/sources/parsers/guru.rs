use crate::model::{PaymentType, RawListing, WorkType};
use crate::sources::html::{
    dollar_amounts, parse_relative_age, resolve_link, select_all_text, select_attr, select_text,
    ParseContext,
};
use crate::sources::ListingParser;
use scraper::ElementRef;

/// guru.com job search results
pub struct GuruParser;

impl ListingParser for GuruParser {
    fn platform(&self) -> &'static str {
        "guru"
    }

    fn entry_selector(&self) -> &'static str {
        "div.jobRecord"
    }

    fn parse_entry(&self, card: ElementRef<'_>, ctx: &ParseContext<'_>) -> Option<RawListing> {
        let href = select_attr(card, ".jobRecord__title a", "href")?;
        let url = resolve_link(&href, ctx.base_url)?;
        let project_id = card
            .value()
            .attr("data-gid")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or_else(|| trailing_number(&href))?;

        let mut raw = RawListing::new(self.platform());
        raw.title = select_text(card, ".jobRecord__title a");
        raw.url = Some(url);
        raw.description = select_text(card, "p.jobRecord__desc");
        raw.currency = Some("USD".to_string());
        raw.work_type = Some(WorkType::Remote);
        raw.posted_date = select_text(card, "div.jobRecord__meta strong:first-child")
            .and_then(|t| parse_relative_age(&t, ctx.now))
            .or(Some(ctx.now));
        raw.skills = select_all_text(card, "div.skillsList a.skillsList__skill--hasHover");

        let budget_text = select_text(card, "div.jobRecord__budget");
        if let Some(text) = &budget_text {
            let amounts = dollar_amounts(text);
            (raw.budget_min, raw.budget_max) = match amounts.as_slice() {
                [] => (None, None),
                [single] => (Some(*single), Some(*single)),
                [min, max, ..] => (Some(*min), Some(*max)),
            };
            raw.payment_type = Some(if text.to_lowercase().contains("hourly") {
                PaymentType::Hourly
            } else {
                PaymentType::Fixed
            });
        }

        let meta = &mut raw.metadata;
        meta.source_id = Some(project_id);
        meta.budget_text = budget_text;
        meta.project_type = Some("remote".to_string());

        Some(raw)
    }

    fn listing_path(&self, source_id: &str) -> String {
        format!("/work/detail/{}", source_id)
    }
}

/// Last all-digit path segment of a link
fn trailing_number(href: &str) -> Option<String> {
    href.split(&['/', '&', '?'][..])
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .last()
        .map(str::to_string)
}
