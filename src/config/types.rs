use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Gig-Crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub codec: CodecConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

impl Config {
    /// Returns the enabled sources, in configuration order
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceEntry> {
        self.sources.iter().filter(|s| s.enabled)
    }
}

/// Cadence loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between cycles of the fast cadence group
    #[serde(rename = "fast-interval", default = "default_fast_interval")]
    pub fast_interval: u64,

    /// Seconds between cycles of the slow cadence group
    #[serde(rename = "slow-interval", default = "default_slow_interval")]
    pub slow_interval: u64,

    /// Update status and metadata of already-persisted listings on re-crawl
    #[serde(rename = "refresh-existing", default)]
    pub refresh_existing: bool,
}

impl SchedulerConfig {
    pub fn interval_for(&self, cadence: Cadence) -> Duration {
        match cadence {
            Cadence::Fast => Duration::from_secs(self.fast_interval),
            Cadence::Slow => Duration::from_secs(self.slow_interval),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fast_interval: default_fast_interval(),
            slow_interval: default_slow_interval(),
            refresh_existing: false,
        }
    }
}

fn default_fast_interval() -> u64 {
    30
}

fn default_slow_interval() -> u64 {
    300
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Public identifier key configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodecConfig {
    /// Hex-encoded 256-bit key; generated at boot when absent
    pub key: Option<String>,
}

/// Polling cadence class of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Fast,
    Slow,
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Slow => "slow",
        }
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One marketplace to poll
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Marketplace name (e.g., "wishket")
    pub platform: String,

    /// Listing page to fetch each cycle
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Cadence group; upwork defaults to fast, everything else to slow
    #[serde(default)]
    pub cadence: Option<Cadence>,

    /// Maximum number of entries taken from one crawl
    #[serde(rename = "target-count", default = "default_target_count")]
    pub target_count: usize,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl SourceEntry {
    /// The configured cadence, or the platform's default
    pub fn cadence(&self) -> Cadence {
        self.cadence.unwrap_or(match self.platform.as_str() {
            "upwork" => Cadence::Fast,
            _ => Cadence::Slow,
        })
    }
}

fn default_target_count() -> usize {
    50
}

fn default_enabled() -> bool {
    true
}
