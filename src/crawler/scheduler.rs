//! Cadence-group scheduler
//!
//! Sources are split into a fast and a slow group. Each group runs its own
//! perpetual loop: crawl every source in order, ingest each source's batch,
//! sleep for the group's interval, repeat. A per-source [`RunFlag`] keeps a
//! source from running twice at once, whether the second run comes from the
//! loop or from a manual trigger.

use crate::config::{Cadence, SchedulerConfig};
use crate::ingest::{ingest_batch, IngestOptions, IngestReport};
use crate::model::CandidateRecord;
use crate::sources::{CrawlError, Source, SourceRegistry};
use crate::state::{LoopState, RunFlag, RunGuard};
use crate::storage::{Storage, StorageResult};
use crate::GigError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Opens a store connection for one loop
pub type StoreFactory = Arc<dyn Fn() -> StorageResult<Box<dyn Storage>> + Send + Sync>;

/// Crawls a source on its own task
///
/// A panic inside the source ends only that task and comes back as
/// [`CrawlError::Aborted`], so the calling loop keeps going.
pub(crate) async fn crawl_isolated(
    source: &Arc<dyn Source>,
) -> Result<Vec<CandidateRecord>, CrawlError> {
    let task_source = Arc::clone(source);
    match tokio::spawn(async move { task_source.crawl().await }).await {
        Ok(result) => result,
        Err(e) => Err(CrawlError::Aborted {
            source_name: source.name().to_string(),
            message: if e.is_panic() {
                "crawl panicked".to_string()
            } else {
                e.to_string()
            },
        }),
    }
}

/// A source and its non-reentrancy flag
#[derive(Clone)]
pub struct ScheduledSource {
    pub source: Arc<dyn Source>,
    pub flag: RunFlag,
}

/// Sources sharing one polling interval
#[derive(Clone)]
struct CadenceGroup {
    cadence: Cadence,
    interval: Duration,
    sources: Vec<ScheduledSource>,
    state: Arc<RwLock<LoopState>>,
}

impl CadenceGroup {
    async fn advance(&self, next: LoopState) {
        let mut state = self.state.write().await;
        match state.transition(next) {
            Ok(s) => *state = s,
            Err(e) => {
                warn!("{} loop: {}; forcing {}", self.cadence, e, next);
                *state = next;
            }
        }
    }
}

/// What one loop iteration did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Sources whose crawl returned
    pub crawled: usize,
    /// Sources whose crawl failed as a whole
    pub failed: usize,
    /// Sources skipped because a previous run was still in progress
    pub skipped: usize,
    /// Candidates returned across all crawled sources
    pub candidates: usize,
    /// Batches rolled back by a storage error
    pub rolled_back: usize,
    pub ingest: IngestReport,
}

impl CycleReport {
    /// New listings stored this cycle
    pub fn inserted(&self) -> usize {
        self.ingest.inserted
    }

    pub fn merge(&mut self, other: &CycleReport) {
        self.crawled += other.crawled;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.candidates += other.candidates;
        self.rolled_back += other.rolled_back;
        self.ingest.merge(&other.ingest);
    }
}

/// Result of a manual single-source run
#[derive(Debug)]
pub enum TriggerOutcome {
    /// Crawled and ingested
    Completed(IngestReport),
    /// The source was already running
    Skipped,
    /// The crawl failed as a whole; nothing was ingested
    Failed(CrawlError),
}

/// Observable state of one cadence loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStatus {
    pub cadence: Cadence,
    pub interval: Duration,
    pub state: LoopState,
    pub sources: Vec<String>,
    /// Sources whose run flag is currently held
    pub running: Vec<String>,
}

/// Fixed round-robin over a static source set, one loop per cadence
#[derive(Clone)]
pub struct Scheduler {
    groups: Vec<CadenceGroup>,
    options: IngestOptions,
}

impl Scheduler {
    /// Groups the registry's sources by cadence
    ///
    /// Empty groups are left out, so a registry with only slow sources runs a
    /// single loop.
    pub fn new(registry: &SourceRegistry, config: &SchedulerConfig) -> Self {
        let groups = [Cadence::Fast, Cadence::Slow]
            .into_iter()
            .filter_map(|cadence| {
                let sources: Vec<ScheduledSource> = registry
                    .with_cadence(cadence)
                    .into_iter()
                    .map(|source| ScheduledSource {
                        source,
                        flag: RunFlag::new(),
                    })
                    .collect();
                (!sources.is_empty()).then(|| CadenceGroup {
                    cadence,
                    interval: config.interval_for(cadence),
                    sources,
                    state: Arc::new(RwLock::new(LoopState::Idle)),
                })
            })
            .collect();

        Self {
            groups,
            options: IngestOptions {
                refresh_existing: config.refresh_existing,
            },
        }
    }

    pub fn cadences(&self) -> Vec<Cadence> {
        self.groups.iter().map(|g| g.cadence).collect()
    }

    fn group(&self, cadence: Cadence) -> Option<&CadenceGroup> {
        self.groups.iter().find(|g| g.cadence == cadence)
    }

    fn find_source(&self, name: &str) -> Option<&ScheduledSource> {
        self.groups
            .iter()
            .flat_map(|g| g.sources.iter())
            .find(|s| s.source.name() == name)
    }

    /// Runs one iteration of a group's loop without sleeping
    ///
    /// Sources are crawled one after another in configuration order. A
    /// source still running from an earlier trigger is skipped; a failed or
    /// panicking crawl is logged and the next source proceeds. Each source's batch is
    /// then ingested in its own transaction.
    pub async fn run_cycle(&self, cadence: Cadence, store: &mut dyn Storage) -> CycleReport {
        let mut report = CycleReport::default();
        let Some(group) = self.group(cadence) else {
            return report;
        };

        // Guards stay held until the source's batch is committed
        let mut batches: Vec<(RunGuard, &str, Vec<CandidateRecord>)> = Vec::new();

        for scheduled in &group.sources {
            let name = scheduled.source.name();
            let Some(guard) = scheduled.flag.try_acquire() else {
                info!("Skipping {}: previous run still in progress", name);
                report.skipped += 1;
                continue;
            };

            match crawl_isolated(&scheduled.source).await {
                Ok(candidates) => {
                    debug!("{} returned {} candidates", name, candidates.len());
                    report.crawled += 1;
                    report.candidates += candidates.len();
                    batches.push((guard, name, candidates));
                }
                Err(e) => {
                    warn!("Crawl of {} failed: {}", name, e);
                    report.failed += 1;
                }
            }
        }

        for (guard, name, candidates) in batches {
            match ingest_batch(&mut *store, candidates, self.options) {
                Ok(ingested) => {
                    debug!("{}: {} new listings", name, ingested.inserted);
                    report.ingest.merge(&ingested);
                }
                Err(e) => {
                    error!("Ingest of {} rolled back: {}", name, e);
                    report.rolled_back += 1;
                }
            }
            drop(guard);
        }

        report
    }

    /// Crawls and ingests one source by name, outside the loops
    ///
    /// # Returns
    ///
    /// * `Ok(TriggerOutcome)` - Completed, skipped because busy, or crawl failed
    /// * `Err(GigError)` - Unknown source, or the batch was rolled back
    pub async fn trigger(
        &self,
        name: &str,
        store: &mut dyn Storage,
    ) -> Result<TriggerOutcome, GigError> {
        let scheduled = self
            .find_source(name)
            .ok_or_else(|| GigError::UnknownSource(name.to_string()))?;

        let Some(_guard) = scheduled.flag.try_acquire() else {
            info!("Trigger for {} skipped: already running", name);
            return Ok(TriggerOutcome::Skipped);
        };

        let candidates = match crawl_isolated(&scheduled.source).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Triggered crawl of {} failed: {}", name, e);
                return Ok(TriggerOutcome::Failed(e));
            }
        };

        let report = ingest_batch(store, candidates, self.options)?;
        info!("Triggered crawl of {} stored {} new listings", name, report.inserted);
        Ok(TriggerOutcome::Completed(report))
    }

    /// Starts one perpetual task per cadence group
    ///
    /// Each task opens its own store connection. The tasks never finish on
    /// their own; abort the handles or exit the runtime to stop them.
    pub fn spawn(&self, open_store: StoreFactory) -> Vec<JoinHandle<()>> {
        self.groups
            .iter()
            .map(|group| {
                let scheduler = self.clone();
                let cadence = group.cadence;
                let open_store = Arc::clone(&open_store);
                tokio::spawn(async move { scheduler.run_loop(cadence, open_store).await })
            })
            .collect()
    }

    async fn run_loop(&self, cadence: Cadence, open_store: StoreFactory) {
        let Some(group) = self.group(cadence) else {
            return;
        };
        info!(
            "Starting {} loop: {} sources every {:?}",
            cadence,
            group.sources.len(),
            group.interval
        );

        let mut store = loop {
            match open_store() {
                Ok(store) => break store,
                Err(e) => {
                    error!("{} loop cannot open store: {}; retrying", cadence, e);
                    tokio::time::sleep(group.interval).await;
                }
            }
        };

        loop {
            group.advance(LoopState::Running).await;
            let report = self.run_cycle(cadence, store.as_mut()).await;
            info!(
                "{} cycle: {} crawled, {} failed, {} skipped, {} candidates, {} new",
                cadence,
                report.crawled,
                report.failed,
                report.skipped,
                report.candidates,
                report.inserted()
            );

            group.advance(LoopState::Sleeping).await;
            tokio::time::sleep(group.interval).await;
            group.advance(LoopState::Idle).await;
        }
    }

    /// Snapshot of every loop
    pub async fn status(&self) -> Vec<GroupStatus> {
        let mut status = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            status.push(GroupStatus {
                cadence: group.cadence,
                interval: group.interval,
                state: *group.state.read().await,
                sources: group
                    .sources
                    .iter()
                    .map(|s| s.source.name().to_string())
                    .collect(),
                running: group
                    .sources
                    .iter()
                    .filter(|s| s.flag.is_running())
                    .map(|s| s.source.name().to_string())
                    .collect(),
            });
        }
        status
    }
}
