//! State module for the cadence loops
//!
//! # Components
//!
//! - `LoopState`: where a cadence group's loop is in its cycle
//! - `RunFlag`: per-source atomic flag that keeps a source from running twice at once

mod loop_state;
mod run_flag;

pub use loop_state::LoopState;
pub use run_flag::{RunFlag, RunGuard};
