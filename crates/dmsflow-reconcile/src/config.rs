//! Timing configuration for reconciled operations

use std::time::Duration;
use tokio::time::Instant;

/// Latest deadline an operation can hold, about thirty years out
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `start + timeout`, capped where the instant would overflow
pub(crate) fn deadline_after(start: Instant, timeout: Duration) -> Instant {
    start
        .checked_add(timeout)
        .unwrap_or_else(|| start + FAR_FUTURE)
}

/// Initial delay and tick interval of one poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTiming {
    /// Wait before the first tick
    pub delay: Duration,
    /// Wait between ticks
    pub interval: Duration,
}

impl PollTiming {
    pub const fn new(delay: Duration, interval: Duration) -> Self {
        Self { delay, interval }
    }

    pub const fn from_secs(delay: u64, interval: u64) -> Self {
        Self::new(Duration::from_secs(delay), Duration::from_secs(interval))
    }
}

/// Timing of every stage of a reconciled operation
///
/// One value is passed by value into the orchestrator. The defaults match the
/// update path of the Kafka provider; tests shrink them freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Overall deadline, measured from the start of the operation (default 50m)
    pub timeout: Duration,

    /// Stability wait between conflicting submissions (default 1s / 10s)
    pub stabilize: PollTiming,

    /// Resource status polling (default 15s / 15s)
    pub state: PollTiming,

    /// Job polling (default 1s / 5s)
    pub task: PollTiming,

    /// Readiness polling (default 10s / 10s)
    pub readiness: PollTiming,

    /// Consecutive not-found ticks tolerated by the state poller (default 20)
    pub not_found_checks: u32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(50 * 60),
            stabilize: PollTiming::from_secs(1, 10),
            state: PollTiming::from_secs(15, 15),
            task: PollTiming::from_secs(1, 5),
            readiness: PollTiming::from_secs(10, 10),
            not_found_checks: 20,
        }
    }
}

impl ReconcileConfig {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_stabilize(mut self, timing: PollTiming) -> Self {
        self.stabilize = timing;
        self
    }

    pub fn with_state(mut self, timing: PollTiming) -> Self {
        self.state = timing;
        self
    }

    pub fn with_task(mut self, timing: PollTiming) -> Self {
        self.task = timing;
        self
    }

    pub fn with_readiness(mut self, timing: PollTiming) -> Self {
        self.readiness = timing;
        self
    }

    pub fn with_not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }
}
