//! Conflict classification for failed submissions
//!
//! The control plane rejects mutations while an instance is busy. Those
//! rejections are transient and worth retrying once the instance settles;
//! everything else is surfaced to the caller unchanged.

use crate::error::ReconcileError;
use crate::transport::TransportError;
use serde_json::Value;

/// A `(status, error_code)` pair known to mean "try again later"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryableSignature {
    pub status: u16,
    pub code: &'static str,
    pub meaning: &'static str,
}

/// Process-wide table of retryable conflicts
pub static RETRYABLE_CONFLICTS: &[RetryableSignature] = &[
    RetryableSignature {
        status: 400,
        code: "DMS.00400026",
        meaning: "operation not allowed in the current instance status",
    },
    RetryableSignature {
        status: 400,
        code: "CBC.99003651",
        meaning: "unsubscribe failed, another operation is being performed",
    },
    RetryableSignature {
        status: 404,
        code: "DMS.00404022",
        meaning: "instance does not exist yet",
    },
];

/// Outcome of one submission attempt
#[derive(Debug)]
pub enum Attempt<T> {
    /// Accepted; do not submit again
    Done(T),
    /// Known conflict; wait for the resource to settle, then resubmit
    Retry(TransportError),
    /// Anything else; abort
    Fatal(ReconcileError),
}

/// Classifies failed transport calls against a static signature table
#[derive(Debug, Clone, Copy)]
pub struct ConflictClassifier {
    table: &'static [RetryableSignature],
}

impl Default for ConflictClassifier {
    fn default() -> Self {
        Self::new(RETRYABLE_CONFLICTS)
    }
}

impl ConflictClassifier {
    pub const fn new(table: &'static [RetryableSignature]) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'static [RetryableSignature] {
        self.table
    }

    /// Sort a submission result into done / retry / fatal
    pub fn triage<T>(&self, result: Result<T, TransportError>) -> Attempt<T> {
        match result {
            Ok(value) => Attempt::Done(value),
            Err(err) => match self.is_retryable(&err) {
                Ok(true) => Attempt::Retry(err),
                Ok(false) => Attempt::Fatal(ReconcileError::Api(err)),
                Err(malformed) => Attempt::Fatal(malformed),
            },
        }
    }

    /// Whether `err` matches a retryable signature
    ///
    /// Only statuses that appear in the table have their body inspected. For
    /// those, a body that is not JSON or carries no `error_code` is an error
    /// in its own right rather than a silent "not retryable".
    pub fn is_retryable(&self, err: &TransportError) -> Result<bool, ReconcileError> {
        let Some(status) = err.status_code() else {
            return Ok(false);
        };
        if !self.table.iter().any(|sig| sig.status == status) {
            return Ok(false);
        }

        let body: Value = serde_json::from_str(err.body().unwrap_or_default()).map_err(|e| {
            ReconcileError::MalformedErrorBody {
                status,
                reason: format!("unmarshal the response body failed: {}", e),
            }
        })?;

        let code = body
            .get("error_code")
            .and_then(Value::as_str)
            .filter(|code| !code.is_empty())
            .ok_or_else(|| ReconcileError::MalformedErrorBody {
                status,
                reason: "unable to find error code from the API response".to_string(),
            })?;

        Ok(self
            .table
            .iter()
            .any(|sig| sig.status == status && sig.code == code))
    }
}
