//! Crawl scheduling and coordination
//!
//! This module drives the sources:
//! - One perpetual loop per cadence group
//! - Per-source non-reentrancy
//! - Manual crawl-and-ingest and probe operations

mod coordinator;
mod scheduler;

pub use coordinator::Coordinator;
pub use scheduler::{
    CycleReport, GroupStatus, ScheduledSource, Scheduler, StoreFactory, TriggerOutcome,
};
