//! HTTP fetcher for listing pages
//!
//! This module handles all HTTP requests for the sources, including:
//! - Building the shared HTTP client with the crawler's user agent
//! - GET requests for listing pages
//! - Error classification into [`CrawlError`]

use crate::config::UserAgentConfig;
use crate::sources::CrawlError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use gig_crawler::config::UserAgentConfig;
/// use gig_crawler::sources::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "GigCrawler".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a listing page and returns its body
///
/// | Condition | Error |
/// |-----------|-------|
/// | HTTP 429 | `RateLimited` |
/// | Other non-2xx | `Http` |
/// | Timeout | `Timeout` |
/// | Connection refused, DNS, TLS | `Unreachable` |
/// | Body not readable | `Body` |
///
/// There is no retry; the next scheduled cycle is the retry.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, CrawlError> {
    debug!("Fetching {}", url);

    let response = client.get(url).send().await.map_err(|e| classify(url, e))?;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(CrawlError::RateLimited {
            url: url.to_string(),
        });
    }

    if !status.is_success() {
        return Err(CrawlError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| CrawlError::Body {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn classify(url: &str, e: reqwest::Error) -> CrawlError {
    if e.is_timeout() {
        CrawlError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() || e.is_request() {
        CrawlError::Unreachable {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        CrawlError::Client(e.to_string())
    }
}
