use crate::model::{ListingStatus, PaymentType, RawListing, WorkType};
use crate::sources::html::{
    dollar_amounts, element_text, parse_days_left, resolve_link, select_all_text, select_text,
    ParseContext,
};
use crate::sources::ListingParser;
use scraper::{ElementRef, Selector};
use url::Url;

const PRIVATE_DESCRIPTION: &str = "Login required to view project details";

/// freelancer.com job search results
pub struct FreelancerParser;

impl ListingParser for FreelancerParser {
    fn platform(&self) -> &'static str {
        "freelancer"
    }

    fn entry_selector(&self) -> &'static str {
        ".JobSearchCard-item"
    }

    fn parse_entry(&self, card: ElementRef<'_>, ctx: &ParseContext<'_>) -> Option<RawListing> {
        let heading = Selector::parse(".JobSearchCard-primary-heading-link").ok()?;
        let link = card.select(&heading).next()?;
        let title = element_text(link);
        let url = resolve_link(link.value().attr("href")?, ctx.base_url)?;

        // Private listings link to a login page carrying the real path in `goto`
        let is_private = title.contains("Private project");
        let project_id = if is_private {
            goto_target(&url)?
        } else {
            path_after_projects(&url)?
        };

        let mut raw = RawListing::new(self.platform());
        raw.title = Some(title);
        raw.url = Some(url);
        raw.currency = Some("USD".to_string());
        raw.work_type = Some(WorkType::Remote);
        raw.posted_date = Some(ctx.now);
        raw.status = Some(if is_private {
            ListingStatus::Private
        } else {
            ListingStatus::Active
        });
        raw.description = if is_private {
            Some(PRIVATE_DESCRIPTION.to_string())
        } else {
            select_text(card, ".JobSearchCard-primary-description")
        };
        raw.skills = select_all_text(card, ".JobSearchCard-primary-tagsLink");

        // First line only; the second is the "Avg Bid" label
        let budget_text = first_line(card, ".JobSearchCard-secondary-price");
        if let Some(text) = &budget_text {
            let amount = dollar_amounts(text).into_iter().next();
            raw.budget_min = amount;
            raw.budget_max = amount;
            raw.payment_type = Some(if text.to_lowercase().contains("/ hr") {
                PaymentType::Hourly
            } else {
                PaymentType::Fixed
            });
        }

        raw.deadline = select_text(card, ".JobSearchCard-primary-heading-days")
            .and_then(|t| parse_days_left(&t, ctx.now));

        let meta = &mut raw.metadata;
        meta.source_id = Some(project_id);
        meta.budget_text = budget_text;
        meta.project_type = Some("remote".to_string());
        meta.insert_extra("is_private", is_private);

        Some(raw)
    }

    fn listing_path(&self, source_id: &str) -> String {
        if source_id.starts_with('/') {
            source_id.to_string()
        } else {
            format!("/projects/{}", source_id)
        }
    }
}

fn first_line(card: ElementRef<'_>, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    card.select(&selector)
        .next()?
        .text()
        .flat_map(str::lines)
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// `https://www.freelancer.com/projects/php/site-fix/` -> `php/site-fix`
fn path_after_projects(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let (_, rest) = url.path().split_once("/projects/")?;
    let id = rest.trim_matches('/');
    (!id.is_empty()).then(|| id.to_string())
}

/// `https://www.freelancer.com/login?goto=%2Fprojects%2Fx` -> `/projects/x`
fn goto_target(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "goto")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}
