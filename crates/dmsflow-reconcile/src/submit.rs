//! Operation submitter
//!
//! Re-issues a mutating request until the control plane accepts it. A
//! retryable conflict means the governing resource is busy with something
//! else, so the loop waits for that resource to settle before trying again.

use crate::classifier::{Attempt, ConflictClassifier};
use crate::config::deadline_after;
use crate::error::{ReconcileError, Result};
use crate::poll::{StateTarget, WaitOptions, wait_for_state};
use crate::refresh::Refresh;
use crate::transport::TransportError;
use std::future::Future;
use tokio::time::{Instant, timeout_at};

/// Submit `request` until it is accepted, rejected, or `options.timeout` passes
///
/// `stability` is polled against `stable` after every retryable conflict,
/// using `options.timing` and whatever time is left. Fatal errors abort
/// immediately; running out of time yields [`ReconcileError::Timeout`].
pub async fn submit<T, F, Fut, R>(
    classifier: &ConflictClassifier,
    mut request: F,
    stability: &R,
    stable: &StateTarget,
    options: &WaitOptions,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, TransportError>>,
    R: Refresh + ?Sized,
{
    let deadline = deadline_after(Instant::now(), options.timeout);
    let mut last_state = String::from("SUBMITTING");
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let result = match timeout_at(deadline, request()).await {
            Ok(result) => result,
            Err(_) => return Err(timed_out(options, last_state)),
        };

        let conflict = match classifier.triage(result) {
            Attempt::Done(value) => {
                tracing::debug!("Submission accepted after {} attempt(s)", attempts);
                return Ok(value);
            }
            Attempt::Fatal(err) => return Err(err),
            Attempt::Retry(conflict) => conflict,
        };

        last_state = conflict
            .error_code()
            .unwrap_or_else(|| "CONFLICT".to_string());
        tracing::warn!(
            "Attempt {} conflicts with another operation ({}), waiting for {:?}",
            attempts,
            last_state,
            stable.target
        );

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(timed_out(options, last_state));
        }
        let wait = WaitOptions {
            timeout: remaining,
            ..*options
        };
        match wait_for_state(stability, stable, &wait).await {
            Ok(snapshot) => last_state = snapshot.state,
            Err(ReconcileError::Timeout { last_state, .. }) => {
                return Err(timed_out(options, last_state));
            }
            Err(err) => return Err(err),
        }
    }
}

fn timed_out(options: &WaitOptions, last_state: String) -> ReconcileError {
    ReconcileError::Timeout {
        waited: options.timeout,
        last_state,
    }
}
