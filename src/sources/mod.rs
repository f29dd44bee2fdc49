//! Marketplace source adapters
//!
//! Every marketplace is a [`Source`]: one `crawl()` call fetches the listing
//! page and returns whatever entries could be parsed. The scheduler only ever
//! sees this trait; HTML details stay inside the per-site parsers.

mod fetcher;
mod html;
mod parsers;

pub use fetcher::{build_http_client, fetch_page};
pub use html::{HtmlListingSource, ListingParser};
pub use parsers::{FreelancerParser, FreemoaParser, GuruParser, UpworkParser, WishketParser};

use crate::config::{Cadence, Config, SourceEntry};
use crate::model::CandidateRecord;
use crate::GigError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Platform names accepted in `[[source]]` entries
pub const SUPPORTED_PLATFORMS: &[&str] = &["wishket", "freemoa", "freelancer", "guru", "upwork"];

/// A whole crawl of one source failed
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("Rate limited by {url}")]
    RateLimited { url: String },

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Cannot reach {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("Unusable response body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Crawl of {source_name} aborted: {message}")]
    Aborted { source_name: String, message: String },
}

/// A marketplace that can be crawled
#[async_trait]
pub trait Source: Send + Sync {
    /// Platform name, unique within a registry
    fn name(&self) -> &str;

    /// Fetches the current listings
    ///
    /// Malformed entries are skipped; a partial result is still `Ok`. Only a
    /// failure of the whole fetch is an error.
    async fn crawl(&self) -> Result<Vec<CandidateRecord>, CrawlError>;

    /// Rebuilds the listing URL for a marketplace-native id
    fn canonical_url(&self, source_id: &str) -> Option<String>;
}

/// A source together with the cadence group it runs in
#[derive(Clone)]
pub struct RegisteredSource {
    pub source: Arc<dyn Source>,
    pub cadence: Cadence,
}

/// The fixed set of sources this process polls, in configuration order
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<RegisteredSource>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds every enabled source from configuration, sharing one HTTP client
    pub fn from_config(config: &Config) -> Result<Self, GigError> {
        let client = build_http_client(&config.user_agent)
            .map_err(|e| CrawlError::Client(e.to_string()))?;

        let mut registry = Self::new();
        for entry in config.enabled_sources() {
            let source = build_source(entry, client.clone())?;
            debug!(
                "Registered source {} ({} cadence, target {})",
                entry.platform, entry.cadence(), entry.target_count
            );
            registry.register(source, entry.cadence());
        }

        info!("Loaded {} enabled sources", registry.len());
        Ok(registry)
    }

    /// Adds a source; a later source with the same name replaces the earlier one
    pub fn register(&mut self, source: Arc<dyn Source>, cadence: Cadence) {
        self.sources.retain(|s| s.source.name() != source.name());
        self.sources.push(RegisteredSource { source, cadence });
    }

    pub fn get(&self, platform: &str) -> Option<Arc<dyn Source>> {
        self.sources
            .iter()
            .find(|s| s.source.name() == platform)
            .map(|s| Arc::clone(&s.source))
    }

    /// Rebuilds a listing URL from platform and marketplace-native id
    pub fn canonical_url(&self, platform: &str, source_id: &str) -> Option<String> {
        self.get(platform)?.canonical_url(source_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredSource> {
        self.sources.iter()
    }

    /// Sources of one cadence group, in configuration order
    pub fn with_cadence(&self, cadence: Cadence) -> Vec<Arc<dyn Source>> {
        self.sources
            .iter()
            .filter(|s| s.cadence == cadence)
            .map(|s| Arc::clone(&s.source))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.sources
            .iter()
            .map(|s| s.source.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Constructs the adapter for one configured source
fn build_source(entry: &SourceEntry, client: Client) -> Result<Arc<dyn Source>, GigError> {
    let base_url = Url::parse(&entry.base_url)
        .map_err(|e| crate::UrlError::Parse(format!("{}: {}", entry.base_url, e)))?;
    let target = entry.target_count;

    let source: Arc<dyn Source> = match entry.platform.as_str() {
        "wishket" => Arc::new(HtmlListingSource::new(WishketParser, base_url, client, target)),
        "freemoa" => Arc::new(HtmlListingSource::new(FreemoaParser, base_url, client, target)),
        "freelancer" => Arc::new(HtmlListingSource::new(
            FreelancerParser,
            base_url,
            client,
            target,
        )),
        "guru" => Arc::new(HtmlListingSource::new(GuruParser, base_url, client, target)),
        "upwork" => Arc::new(HtmlListingSource::new(UpworkParser, base_url, client, target)),
        other => return Err(GigError::UnknownSource(other.to_string())),
    };
    Ok(source)
}
