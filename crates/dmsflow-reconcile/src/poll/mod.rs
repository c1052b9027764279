//! Pollers
//!
//! Each poller sleeps an initial delay, then ticks at a fixed interval until
//! a terminal observation or the deadline. Ticks are strictly sequential and
//! the deadline covers the initial delay as well.

mod readiness;
mod state;
mod task;

pub use readiness::wait_for_readiness;
pub use state::wait_for_state;
pub use task::{TASK_DELETED, TASK_FAILED, TASK_SUCCESS, Task, TaskPhase, wait_for_task};

use crate::config::PollTiming;
use std::time::Duration;

/// Timing and deadline of one poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub timing: PollTiming,
    pub timeout: Duration,
    /// Consecutive not-found ticks tolerated before giving up (state poller only)
    pub not_found_checks: u32,
}

impl WaitOptions {
    pub fn new(timing: PollTiming, timeout: Duration) -> Self {
        Self {
            timing,
            timeout,
            not_found_checks: 20,
        }
    }

    pub fn with_not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }
}

/// Pending and target state sets of a status wait
///
/// A state in neither set is treated as a terminal failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTarget {
    pub pending: Vec<String>,
    pub target: Vec<String>,
}

impl StateTarget {
    pub fn new<P, T>(pending: P, target: T) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            pending: pending.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_target(&self, state: &str) -> bool {
        self.target.iter().any(|s| s == state)
    }

    pub fn is_pending(&self, state: &str) -> bool {
        self.pending.iter().any(|s| s == state)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_target_membership() {
        let states = StateTarget::new(["CREATING"], ["RUNNING", "WAITING"]);
        assert!(states.is_pending("CREATING"));
        assert!(states.is_target("WAITING"));
        assert!(!states.is_pending("ERROR"));
        assert!(!states.is_target("ERROR"));
    }
}
