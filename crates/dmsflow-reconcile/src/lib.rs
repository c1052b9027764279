//! DMSFlow Reconciliation Core
//!
//! Drives long-running, eventually-consistent remote operations (instance
//! create, resize, advertised-IP rebind, parameter update, quota change,
//! connector task management) to a terminal state from a single awaited call.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  Orchestrator                    │
//! │   begin(op) ─► submit ─► wait_for_{state,task,   │
//! │                           readiness}             │
//! └───────┬───────────────┬─────────────────────────┘
//!         │               │
//! ┌───────▼───────┐ ┌─────▼──────────────────────────┐
//! │   Submitter   │ │            Pollers              │
//! │ (retry loop)  │ │  state │ task │ readiness       │
//! └───────┬───────┘ └─────┬──────────────────────────┘
//!         │               │
//! ┌───────▼───────┐ ┌─────▼──────┐
//! │  Classifier   │ │  Refresh   │  (one impl per entity kind)
//! └───────┬───────┘ └─────┬──────┘
//!         └───────┬───────┘
//!         ┌───────▼───────┐
//!         │   Transport   │  (external)
//!         └───────────────┘
//! ```
//!
//! Nothing is cached locally: every tick re-fetches remote state, and ticks of
//! one operation never overlap.

pub mod classifier;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod poll;
pub mod refresh;
pub mod submit;
pub mod transport;

// Re-exports
pub use classifier::{Attempt, ConflictClassifier, RETRYABLE_CONFLICTS, RetryableSignature};
pub use config::{PollTiming, ReconcileConfig};
pub use error::{ErrorKind, FetchError, ReconcileError, Result};
pub use orchestrator::{Operation, Orchestrator, Stage};
pub use poll::{
    StateTarget, Task, TaskPhase, WaitOptions, wait_for_readiness, wait_for_state, wait_for_task,
};
pub use refresh::{Refresh, RefreshFn, Snapshot, refresh_fn};
pub use submit::submit;
pub use transport::{Method, Request, Transport, TransportError};

/// Status value that the state poller synthesizes when a resource is gone.
pub const DELETED: &str = "DELETED";
