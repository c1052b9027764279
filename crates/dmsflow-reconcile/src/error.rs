//! Reconciliation error types

use crate::orchestrator::Stage;
use crate::transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Label reported when a poll tick cannot reach the server
pub const QUERY_ERROR: &str = "QUERY ERROR";

/// Label reported when a poll tick cannot interpret the server's answer
pub const PARSE_ERROR: &str = "PARSE ERROR";

/// Failure of a single refresh (poll tick)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("resource not found: {0}")]
    NotFound(TransportError),

    #[error(transparent)]
    Transport(TransportError),

    #[error("unable to parse response: {0}")]
    Parse(String),
}

impl FetchError {
    /// State label used in logs and in [`ReconcileError::Query`]
    pub fn label(&self) -> &'static str {
        match self {
            FetchError::Parse(_) => PARSE_ERROR,
            _ => QUERY_ERROR,
        }
    }
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        match err {
            err if err.is_not_found() => FetchError::NotFound(err),
            TransportError::Decode(reason) => FetchError::Parse(reason),
            err => FetchError::Transport(err),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

/// Errors surfaced by the reconciliation core
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Submission rejected with an error that is not a known conflict
    #[error("API error: {0}")]
    Api(TransportError),

    /// A classified error response whose body could not be interpreted
    #[error("unable to classify error response (status {status}): {reason}")]
    MalformedErrorBody { status: u16, reason: String },

    #[error("task {task_id} finished with status {status}")]
    TaskFailed { task_id: String, status: String },

    #[error("unexpected state '{state}', wanted target {target:?} (pending {pending:?})")]
    UnexpectedState {
        state: String,
        pending: Vec<String>,
        target: Vec<String>,
    },

    #[error("{state}: {source}")]
    Query {
        state: &'static str,
        source: FetchError,
    },

    #[error("resource not found after {checks} consecutive checks")]
    ResourceNotFound { checks: u32 },

    #[error("timeout while waiting: waited {}s, still in state '{last_state}'", .waited.as_secs())]
    Timeout {
        waited: Duration,
        last_state: String,
    },

    #[error("{operation}: {stage} failed: {source}")]
    Stage {
        operation: String,
        stage: Stage,
        source: Box<ReconcileError>,
    },
}

/// Coarse classification of a [`ReconcileError`]
///
/// Stage wrappers are looked through, so callers can tell "the operation
/// failed" from "we lost the ability to observe it" from "we ran out of time".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The submission itself was rejected
    Fatal,
    /// The remote job reached FAILED or DELETED
    TaskFailed,
    /// The resource reached a state nobody declared
    UnexpectedState,
    /// A poll tick could not reach or interpret the server
    Query,
    /// The deadline passed before a terminal state
    Timeout,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Fatal => write!(f, "fatal"),
            ErrorKind::TaskFailed => write!(f, "task-failed"),
            ErrorKind::UnexpectedState => write!(f, "unexpected-state"),
            ErrorKind::Query => write!(f, "query"),
            ErrorKind::Timeout => write!(f, "timeout"),
        }
    }
}

impl ReconcileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::Api(_) | ReconcileError::MalformedErrorBody { .. } => ErrorKind::Fatal,
            ReconcileError::TaskFailed { .. } => ErrorKind::TaskFailed,
            ReconcileError::UnexpectedState { .. } => ErrorKind::UnexpectedState,
            ReconcileError::Query { .. } | ReconcileError::ResourceNotFound { .. } => {
                ErrorKind::Query
            }
            ReconcileError::Timeout { .. } => ErrorKind::Timeout,
            ReconcileError::Stage { source, .. } => source.kind(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }

    /// Outermost stage that failed, if the error came through an orchestrator
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ReconcileError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost error with all stage wrappers removed
    pub fn root(&self) -> &ReconcileError {
        match self {
            ReconcileError::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
