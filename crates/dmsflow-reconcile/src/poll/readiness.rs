//! Readiness poller
//!
//! For end conditions that are not a single status value, such as "every
//! broker has an advertised address".

use super::WaitOptions;
use crate::error::{ReconcileError, Result};
use crate::refresh::Refresh;
use tokio::time::{sleep, timeout};

/// Poll `refresh` until `is_ready` holds for the fetched object
///
/// The predicate is evaluated from scratch on every tick against a freshly
/// fetched object. Partial progress is indistinguishable from no progress.
pub async fn wait_for_readiness<R, P>(
    refresh: &R,
    is_ready: P,
    options: &WaitOptions,
) -> Result<R::Output>
where
    R: Refresh + ?Sized,
    P: Fn(&R::Output) -> bool,
{
    let mut last_state = String::from("PENDING");
    let outcome = timeout(
        options.timeout,
        poll_readiness(refresh, &is_ready, options, &mut last_state),
    )
    .await;

    match outcome {
        Ok(result) => result,
        Err(_) => Err(ReconcileError::Timeout {
            waited: options.timeout,
            last_state,
        }),
    }
}

async fn poll_readiness<R, P>(
    refresh: &R,
    is_ready: &P,
    options: &WaitOptions,
    last_state: &mut String,
) -> Result<R::Output>
where
    R: Refresh + ?Sized,
    P: Fn(&R::Output) -> bool,
{
    sleep(options.timing.delay).await;

    loop {
        let snapshot = refresh
            .refresh()
            .await
            .map_err(|err| ReconcileError::Query {
                state: err.label(),
                source: err,
            })?;
        last_state.clone_from(&snapshot.state);

        if let Some(object) = snapshot.object {
            if is_ready(&object) {
                return Ok(object);
            }
        }
        tracing::debug!("Not ready yet, current state: {}", snapshot.state);

        sleep(options.timing.interval).await;
    }
}
