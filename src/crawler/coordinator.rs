//! Crawl coordination
//!
//! The [`Coordinator`] owns the source registry and the scheduler built from
//! it. It backs the long-running mode (one loop per cadence) as well as the
//! manual operations: crawl everything once, or probe a single source without
//! persisting anything.

use crate::config::Config;
use crate::crawler::scheduler::{crawl_isolated, CycleReport, Scheduler, StoreFactory};
use crate::model::CandidateRecord;
use crate::sources::SourceRegistry;
use crate::storage::Storage;
use crate::GigError;
use tokio::task::JoinHandle;
use tracing::info;

/// Main crawl orchestration structure
pub struct Coordinator {
    registry: SourceRegistry,
    scheduler: Scheduler,
}

impl Coordinator {
    /// Builds every enabled source and groups them by cadence
    pub fn new(config: &Config) -> Result<Self, GigError> {
        let registry = SourceRegistry::from_config(config)?;
        Ok(Self::with_registry(registry, config))
    }

    /// Uses an already assembled registry
    pub fn with_registry(registry: SourceRegistry, config: &Config) -> Self {
        let scheduler = Scheduler::new(&registry, &config.scheduler);
        Self {
            registry,
            scheduler,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Runs one cycle of every cadence group back to back
    ///
    /// Sources busy in a running loop are skipped, failed sources are logged
    /// and left out. The returned report's `inserted()` is the number of new
    /// listings stored.
    pub async fn crawl_all_once(&self, store: &mut dyn Storage) -> CycleReport {
        let mut total = CycleReport::default();
        for cadence in self.scheduler.cadences() {
            let report = self.scheduler.run_cycle(cadence, &mut *store).await;
            total.merge(&report);
        }

        info!(
            "Manual crawl: {} sources crawled, {} failed, {} new listings",
            total.crawled,
            total.failed,
            total.inserted()
        );
        total
    }

    /// Crawls one source and returns its candidates without storing them
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<CandidateRecord>)` - What the source yielded right now
    /// * `Err(GigError::UnknownSource)` - No enabled source has that name
    /// * `Err(GigError::Crawl)` - The crawl failed as a whole
    pub async fn probe(&self, platform: &str) -> Result<Vec<CandidateRecord>, GigError> {
        let source = self
            .registry
            .get(platform)
            .ok_or_else(|| GigError::UnknownSource(platform.to_string()))?;

        let candidates = crawl_isolated(&source).await?;
        info!("Probe of {} yielded {} candidates", platform, candidates.len());
        Ok(candidates)
    }

    /// Starts the cadence loops; see [`Scheduler::spawn`]
    pub fn start(&self, open_store: StoreFactory) -> Vec<JoinHandle<()>> {
        self.scheduler.spawn(open_store)
    }
}
