//! Resource state poller

use super::{StateTarget, WaitOptions};
use crate::DELETED;
use crate::error::{FetchError, ReconcileError, Result};
use crate::refresh::{Refresh, Snapshot};
use tokio::time::{sleep, timeout};

/// Poll `refresh` until its state lands in `states.target`
///
/// - a target state returns the snapshot
/// - a pending state keeps polling
/// - any other state fails immediately with [`ReconcileError::UnexpectedState`]
/// - not-found while `DELETED` is a target returns a synthetic `DELETED`
///   snapshot; otherwise it is tolerated for `not_found_checks` ticks
/// - any other fetch failure is a [`ReconcileError::Query`]
/// - the deadline yields [`ReconcileError::Timeout`] with the last seen state
pub async fn wait_for_state<R>(
    refresh: &R,
    states: &StateTarget,
    options: &WaitOptions,
) -> Result<Snapshot<R::Output>>
where
    R: Refresh + ?Sized,
{
    let mut last_state = String::from("PENDING");
    let outcome = timeout(
        options.timeout,
        poll_state(refresh, states, options, &mut last_state),
    )
    .await;

    match outcome {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!(
                "Timed out waiting for {:?}, last state: {}",
                states.target,
                last_state
            );
            Err(ReconcileError::Timeout {
                waited: options.timeout,
                last_state,
            })
        }
    }
}

async fn poll_state<R>(
    refresh: &R,
    states: &StateTarget,
    options: &WaitOptions,
    last_state: &mut String,
) -> Result<Snapshot<R::Output>>
where
    R: Refresh + ?Sized,
{
    sleep(options.timing.delay).await;

    let mut not_found = 0u32;
    loop {
        match refresh.refresh().await {
            Ok(snapshot) => {
                not_found = 0;
                last_state.clone_from(&snapshot.state);

                if states.is_target(&snapshot.state) {
                    tracing::debug!("Reached target state: {}", snapshot.state);
                    return Ok(snapshot);
                }
                if !states.is_pending(&snapshot.state) {
                    return Err(ReconcileError::UnexpectedState {
                        state: snapshot.state,
                        pending: states.pending.clone(),
                        target: states.target.clone(),
                    });
                }
                tracing::debug!(
                    "Waiting for {:?}, current state: {}",
                    states.target,
                    snapshot.state
                );
            }
            Err(FetchError::NotFound(err)) => {
                if states.is_target(DELETED) {
                    tracing::debug!("Resource not found, treating as {}", DELETED);
                    return Ok(Snapshot::missing(DELETED));
                }

                not_found += 1;
                if not_found > options.not_found_checks {
                    return Err(ReconcileError::ResourceNotFound { checks: not_found });
                }
                tracing::debug!(
                    "Resource not found ({}/{}): {}",
                    not_found,
                    options.not_found_checks,
                    err
                );
            }
            Err(err) => {
                return Err(ReconcileError::Query {
                    state: err.label(),
                    source: err,
                });
            }
        }

        sleep(options.timing.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollTiming;
    use crate::error::ErrorKind;
    use crate::poll::testing::Scripted;
    use crate::transport::TransportError;
    use std::time::Duration;
    use tokio::time::Instant;

    fn options(timeout_secs: u64) -> WaitOptions {
        WaitOptions::new(PollTiming::from_secs(1, 5), Duration::from_secs(timeout_secs))
    }

    fn creating() -> StateTarget {
        StateTarget::new(["CREATING"], ["RUNNING"])
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaches_target() {
        let refresh = Scripted::states(&["CREATING", "CREATING", "RUNNING"], "inst-1");

        let snapshot = wait_for_state(&refresh, &creating(), &options(60))
            .await
            .unwrap();

        assert_eq!(snapshot.state, "RUNNING");
        assert_eq!(snapshot.object, Some("inst-1"));
        assert_eq!(refresh.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_at_deadline_not_before() {
        let refresh = Scripted::states(&["CREATING"], ());
        let started = Instant::now();

        let err = wait_for_state(&refresh, &creating(), &options(60))
            .await
            .unwrap_err();

        assert!(started.elapsed() >= Duration::from_secs(60));
        assert_eq!(err.kind(), ErrorKind::Timeout);
        match err {
            ReconcileError::Timeout { last_state, waited } => {
                assert_eq!(last_state, "CREATING");
                assert_eq!(waited, Duration::from_secs(60));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_state_short_circuits() {
        let refresh = Scripted::states(&["CREATING", "ERROR", "RUNNING"], ());
        let started = Instant::now();

        let err = wait_for_state(&refresh, &creating(), &options(600))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnexpectedState);
        assert_eq!(refresh.calls(), 2);
        // one delay plus one interval, nowhere near the deadline
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_deleted_when_targeted() {
        let refresh: Scripted<()> = Scripted::new(vec![
            Ok(Snapshot::new((), "DELETING")),
            Err(TransportError::status(404, r#"{"error_code":"DMS.00404022"}"#).into()),
        ]);
        let states = StateTarget::new(["DELETING", "RUNNING", "ERROR"], [DELETED]);

        let snapshot = wait_for_state(&refresh, &states, &options(600))
            .await
            .unwrap();

        assert_eq!(snapshot.state, DELETED);
        assert!(snapshot.object.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_tolerated_then_fails() {
        let refresh: Scripted<()> = Scripted::new(vec![Err(TransportError::status(
            404, "{}",
        )
        .into())]);
        let opts = options(600).with_not_found_checks(3);

        let err = wait_for_state(&refresh, &creating(), &opts)
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::ResourceNotFound { checks: 4 }));
        assert_eq!(err.kind(), ErrorKind::Query);
        assert_eq!(refresh.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_then_visible() {
        let refresh: Scripted<()> = Scripted::new(vec![
            Err(TransportError::status(404, "{}").into()),
            Ok(Snapshot::new((), "CREATING")),
            Ok(Snapshot::new((), "RUNNING")),
        ]);

        let snapshot = wait_for_state(&refresh, &creating(), &options(600))
            .await
            .unwrap();
        assert_eq!(snapshot.state, "RUNNING");
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_error_is_distinct() {
        let refresh: Scripted<()> = Scripted::new(vec![
            Ok(Snapshot::new((), "CREATING")),
            Err(TransportError::Connection("connection reset".into()).into()),
        ]);

        let err = wait_for_state(&refresh, &creating(), &options(600))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Query);
        assert!(err.to_string().starts_with("QUERY ERROR"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parse_error_label() {
        let refresh: Scripted<()> = Scripted::new(vec![Err(FetchError::Parse(
            "expected value".into(),
        ))]);

        let err = wait_for_state(&refresh, &creating(), &options(600))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Query {
                state: "PARSE ERROR",
                ..
            }
        ));
    }
}
