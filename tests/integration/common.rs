//! Shared fixtures

use chrono::{TimeZone, Utc};
use gig_crawler::config::{
    Cadence, CodecConfig, Config, SchedulerConfig, SourceEntry, StorageConfig, UserAgentConfig,
};
use gig_crawler::model::{ListingMetadata, ListingStatus, PaymentType, WorkType};
use gig_crawler::CandidateRecord;

/// A valid candidate with the given natural key and native id
pub fn candidate(platform: &str, url: &str, source_id: &str) -> CandidateRecord {
    CandidateRecord {
        platform: platform.to_string(),
        title: format!("{} listing {}", platform, source_id),
        description: Some("Needs doing".to_string()),
        budget_min: Some(200.0),
        budget_max: Some(800.0),
        currency: "USD".to_string(),
        posted_date: Utc.with_ymd_and_hms(2024, 6, 3, 9, 30, 0).unwrap(),
        deadline: None,
        skills: ["python".to_string()].into_iter().collect(),
        url: url.to_string(),
        status: ListingStatus::Active,
        work_type: WorkType::Remote,
        payment_type: PaymentType::Fixed,
        metadata: ListingMetadata::with_source_id(source_id),
    }
}

pub fn source_entry(platform: &str, base_url: &str, cadence: Cadence) -> SourceEntry {
    SourceEntry {
        platform: platform.to_string(),
        base_url: base_url.to_string(),
        cadence: Some(cadence),
        target_count: 50,
        enabled: true,
    }
}

pub fn test_config(sources: Vec<SourceEntry>, database_path: &str) -> Config {
    Config {
        scheduler: SchedulerConfig {
            fast_interval: 1,
            slow_interval: 2,
            refresh_existing: false,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        storage: StorageConfig {
            database_path: database_path.to_string(),
        },
        codec: CodecConfig::default(),
        sources,
    }
}

/// A guru.com-style search page with one card per id
pub fn guru_page(ids: &[u32]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div class="jobRecord" data-gid="{id}">
                  <h2 class="jobRecord__title"><a href="/work/detail/{id}">Job {id}</a></h2>
                  <div class="jobRecord__meta"><strong>Posted 2 hours ago</strong></div>
                  <p class="jobRecord__desc">Description {id}</p>
                  <div class="jobRecord__budget">Fixed Price | $250-$500</div>
                </div>"#
            )
        })
        .collect();
    format!("<html><body><div class=\"jobList\">{}</div></body></html>", cards)
}

/// A wishket-style project list with one card per id
pub fn wishket_page(ids: &[u32]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div class="project-info-box">
                  <div class="project-type-mark">원격</div>
                  <a class="project-link" href="/project/{id}/"><p class="subtitle-1-half-medium">프로젝트 {id}</p></a>
                  <p class="budget"><span class="body-1-medium">300만원</span></p>
                </div>"#
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", cards)
}
