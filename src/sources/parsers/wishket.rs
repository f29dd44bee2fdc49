use crate::model::{ClientInfo, ListingStatus, PaymentType, RawListing, WorkType};
use crate::sources::html::{
    first_number, parse_krw_range, resolve_link, select_all_text, select_attr, select_text,
    ParseContext,
};
use crate::sources::ListingParser;
use scraper::ElementRef;

/// wishket.com project list
pub struct WishketParser;

impl ListingParser for WishketParser {
    fn platform(&self) -> &'static str {
        "wishket"
    }

    fn entry_selector(&self) -> &'static str {
        "div.project-info-box"
    }

    fn parse_entry(&self, card: ElementRef<'_>, ctx: &ParseContext<'_>) -> Option<RawListing> {
        let href = select_attr(card, "a.project-link", "href")?;
        let url = resolve_link(&href, ctx.base_url)?;
        let project_id = project_id_from_path(&href)?;

        let mut raw = RawListing::new(self.platform());
        raw.title = select_text(card, "p.subtitle-1-half-medium");
        raw.url = Some(url);
        raw.currency = Some("KRW".to_string());
        // The list page carries no posting time
        raw.posted_date = Some(ctx.now);

        let budget_text = select_text(card, "p.budget span.body-1-medium");
        if let Some(text) = &budget_text {
            (raw.budget_min, raw.budget_max) = parse_krw_range(text);
        }

        let project_type = select_text(card, "div.project-type-mark").unwrap_or_default();
        (raw.work_type, raw.payment_type) = if project_type.contains("상주") {
            (Some(WorkType::Onsite), Some(PaymentType::Monthly))
        } else if project_type.contains("혼합") {
            (Some(WorkType::Hybrid), Some(PaymentType::Fixed))
        } else {
            (Some(WorkType::Remote), Some(PaymentType::Fixed))
        };

        if select_text(card, "div.project-status").is_some_and(|s| s.contains("모집마감")) {
            raw.status = Some(ListingStatus::Closed);
        }

        let category = select_text(card, "p.project-category-or-role");
        let field = select_text(card, "p.project-field");
        let subcategory = select_text(card, "p.project-field-subcategory");
        let term = select_text(card, "p.term span.body-1-medium");
        let location = select_text(card, "p.location");

        let mut parts: Vec<String> = [&category, &field, &subcategory]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        if let Some(term) = &term {
            parts.push(format!("기간: {}", term));
        }
        if let Some(location) = &location {
            parts.push(format!("위치: {}", location));
        }
        raw.description = Some(parts.join(" | "));

        raw.skills = select_all_text(card, "div.skill-stack span.body-2-medium");

        let meta = &mut raw.metadata;
        meta.source_id = Some(project_id);
        meta.category = category;
        meta.location = location;
        meta.term = term;
        meta.budget_text = budget_text;
        meta.project_type = Some(project_type).filter(|t| !t.is_empty());
        meta.applicants =
            select_text(card, "p.applicants span.body-1-medium").and_then(|t| first_number(&t));

        let client_name = select_text(card, "p.client-name");
        let client_rating = select_text(card, "p.rating span.body-1-medium")
            .and_then(|t| t.parse::<f64>().ok());
        if client_name.is_some() || client_rating.is_some() {
            meta.client = Some(ClientInfo {
                name: client_name,
                rating: client_rating,
            });
        }

        if let Some(field) = field {
            meta.insert_extra("field", field);
        }
        if let Some(views) =
            select_text(card, "p.view-count span.body-1-medium").and_then(|t| first_number(&t))
        {
            meta.insert_extra("view_count", views);
        }
        if let Some(interest) =
            select_text(card, "p.interest-count span.body-1-medium").and_then(|t| first_number(&t))
        {
            meta.insert_extra("interest_count", interest);
        }

        Some(raw)
    }

    fn listing_path(&self, source_id: &str) -> String {
        format!("/project/{}/", source_id)
    }
}

/// `/project/142399/` -> `142399`
fn project_id_from_path(href: &str) -> Option<String> {
    let path = href.split(&['?', '#'][..]).next()?;
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    while let Some(segment) = segments.next() {
        if segment == "project" {
            return segments
                .next()
                .filter(|id| id.chars().all(|c| c.is_ascii_digit()))
                .map(str::to_string);
        }
    }
    None
}
