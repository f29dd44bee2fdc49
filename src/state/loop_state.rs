/// Cadence loop state definitions
///
/// Each cadence group runs `Idle -> Running -> Sleeping -> Idle` forever.
use crate::GigError;
use std::fmt;

/// Represents where a cadence loop is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoopState {
    /// Waiting to start the next cycle
    #[default]
    Idle,

    /// Crawling and ingesting the group's sources
    Running,

    /// Waiting out the group's interval
    Sleeping,
}

impl LoopState {
    /// Returns true if the loop may move from `self` to `next`
    pub fn can_transition_to(&self, next: LoopState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Sleeping)
                | (Self::Sleeping, Self::Idle)
        )
    }

    /// Moves to `next`, rejecting transitions outside the cycle
    pub fn transition(self, next: LoopState) -> Result<LoopState, GigError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(GigError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Sleeping => "sleeping",
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
