use crate::model::{PaymentType, RawListing, WorkType};
use crate::sources::html::{
    element_text, first_number, parse_days_left, parse_krw_range, select_attr, select_text,
    ParseContext,
};
use crate::sources::ListingParser;
use scraper::{ElementRef, Selector};

const CITIES: &[&str] = &["서울", "경기", "인천", "부산"];

/// freemoa.net project list
pub struct FreemoaParser;

impl ListingParser for FreemoaParser {
    fn platform(&self) -> &'static str {
        "freemoa"
    }

    fn entry_selector(&self) -> &'static str {
        "li.proj-list-item_li_new"
    }

    fn parse_entry(&self, card: ElementRef<'_>, ctx: &ParseContext<'_>) -> Option<RawListing> {
        let title = select_text(card, "p.title")?;
        let pno = select_attr(card, "div.projTitle", "data-pno")?;
        let url = ctx.base_url.join(&self.listing_path(&pno)).ok()?;

        let mut raw = RawListing::new(self.platform());
        raw.title = Some(title);
        raw.url = Some(url.to_string());
        raw.currency = Some("KRW".to_string());
        raw.posted_date = Some(ctx.now);

        // "상주" marks on-site monthly work, "도급" a remote fixed contract
        let onsite = select_text(card, "p.d").is_some_and(|t| t.contains("상주"));
        let contract = select_text(card, "p.b").is_some();
        let (project_type, budget_label) = if onsite {
            raw.work_type = Some(WorkType::Onsite);
            raw.payment_type = Some(PaymentType::Monthly);
            (Some("상주"), Some("월 임금"))
        } else if contract {
            raw.work_type = Some(WorkType::Remote);
            raw.payment_type = Some(PaymentType::Fixed);
            (Some("도급"), Some("예상비용"))
        } else {
            (None, None)
        };

        let info = info_values(card);
        let budget_text = budget_label.and_then(|label| {
            info.iter()
                .find(|(l, _)| l.contains(label))
                .map(|(_, v)| v.clone())
        });
        if let Some(text) = &budget_text {
            (raw.budget_min, raw.budget_max) = parse_krw_range(text);
        }

        let values: Vec<&String> = info.iter().map(|(_, v)| v).collect();
        let term = values
            .iter()
            .find(|v| v.contains('일') && !v.contains("D-"))
            .map(|v| v.to_string());
        let applicants = values
            .iter()
            .find(|v| v.contains('명'))
            .and_then(|v| first_number(v));
        raw.deadline = values
            .iter()
            .find(|v| v.contains("D-"))
            .and_then(|v| parse_days_left(v, ctx.now));
        let location = values
            .iter()
            .find(|v| CITIES.iter().any(|c| v.contains(c)))
            .map(|v| v.to_string());

        let category = select_text(card, "div.projectInfo > div:first-child");
        let notice = category.clone().filter(|c| c.starts_with('※'));
        raw.description = notice.or_else(|| category.clone());

        if let Some(category) = &category {
            raw.skills = category
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty() && !s.starts_with('※'))
                .map(str::to_string)
                .collect();
        }

        let meta = &mut raw.metadata;
        meta.source_id = Some(pno);
        meta.category = category;
        meta.location = location;
        meta.term = term;
        meta.applicants = applicants;
        meta.budget_text = budget_text;
        meta.project_type = project_type.map(str::to_string);

        Some(raw)
    }

    fn listing_path(&self, source_id: &str) -> String {
        format!("/m4/s42?pno={}", source_id)
    }
}

/// `(label, bold value)` pairs from the card's info rows
fn info_values(card: ElementRef<'_>) -> Vec<(String, String)> {
    let (Ok(rows), Ok(bold)) = (
        Selector::parse("div.projectInfo p"),
        Selector::parse("b"),
    ) else {
        return Vec::new();
    };

    card.select(&rows)
        .filter_map(|row| {
            let value = row.select(&bold).next().map(element_text)?;
            Some((element_text(row), value))
        })
        .filter(|(_, v)| !v.is_empty())
        .collect()
}
