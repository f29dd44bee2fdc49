//! Source adapters against mock marketplace pages

use crate::common::{guru_page, test_config, wishket_page};
use gig_crawler::config::UserAgentConfig;
use gig_crawler::sources::{
    build_http_client, CrawlError, GuruParser, HtmlListingSource, Source, WishketParser,
};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_agent() -> UserAgentConfig {
    test_config(Vec::new(), ":memory:").user_agent
}

async fn serve(server: &MockServer, at: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

fn guru_source(server: &MockServer, target: usize) -> HtmlListingSource<GuruParser> {
    let base = Url::parse(&format!("{}/d/jobs/", server.uri())).unwrap();
    let client = build_http_client(&user_agent()).unwrap();
    HtmlListingSource::new(GuruParser, base, client, target)
}

#[tokio::test]
async fn test_crawl_parses_served_page() {
    let server = MockServer::start().await;
    serve(&server, "/d/jobs/", 200, guru_page(&[11, 12, 13])).await;

    let records = guru_source(&server, 50).crawl().await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].platform, "guru");
    assert_eq!(records[0].url, format!("{}/work/detail/11", server.uri()));
    assert_eq!(records[0].source_id(), Some("11"));
    assert_eq!(records[2].budget_max, Some(500.0));
}

#[tokio::test]
async fn test_target_count_limits_batch() {
    let server = MockServer::start().await;
    serve(&server, "/d/jobs/", 200, guru_page(&[1, 2, 3, 4, 5])).await;

    let records = guru_source(&server, 2).crawl().await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_malformed_cards_are_partial_success() {
    let server = MockServer::start().await;
    let page = guru_page(&[21]).replace(
        "</div></body>",
        r#"<div class="jobRecord"><h2 class="jobRecord__title"></h2></div></div></body>"#,
    );
    serve(&server, "/d/jobs/", 200, page).await;

    let records = guru_source(&server, 50).crawl().await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_empty_page_is_not_an_error() {
    let server = MockServer::start().await;
    serve(&server, "/d/jobs/", 200, "<html><body></body></html>".to_string()).await;

    let records = guru_source(&server, 50).crawl().await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_server_errors_fail_the_crawl() {
    let server = MockServer::start().await;
    serve(&server, "/d/jobs/", 503, String::new()).await;

    let result = guru_source(&server, 50).crawl().await;
    assert!(matches!(result, Err(CrawlError::Http { status: 503, .. })));
}

#[tokio::test]
async fn test_rate_limit_is_reported() {
    let server = MockServer::start().await;
    serve(&server, "/d/jobs/", 429, String::new()).await;

    let result = guru_source(&server, 50).crawl().await;
    assert!(matches!(result, Err(CrawlError::RateLimited { .. })));
}

#[tokio::test]
async fn test_canonical_url_round_trip() {
    let server = MockServer::start().await;
    serve(&server, "/project/", 200, wishket_page(&[142399])).await;

    let base = Url::parse(&format!("{}/project/", server.uri())).unwrap();
    let client = build_http_client(&user_agent()).unwrap();
    let source = HtmlListingSource::new(WishketParser, base, client, 50);

    let records = source.crawl().await.unwrap();
    assert_eq!(records.len(), 1);
    let native = records[0].source_id().unwrap();
    assert_eq!(native, "142399");
    assert_eq!(source.canonical_url(native).as_deref(), Some(records[0].url.as_str()));
    assert!(source.canonical_url("  ").is_none());
}
