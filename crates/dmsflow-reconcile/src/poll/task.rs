//! Job/task poller

use super::WaitOptions;
use crate::error::{FetchError, ReconcileError, Result};
use crate::refresh::Refresh;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::{sleep, timeout};

pub const TASK_SUCCESS: &str = "SUCCESS";
pub const TASK_FAILED: &str = "FAILED";
pub const TASK_DELETED: &str = "DELETED";

/// Remote record of a long-running operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(alias = "job_id", alias = "task_id")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Task {
    pub fn phase(&self) -> TaskPhase {
        TaskPhase::of(&self.status)
    }
}

/// Where a job status sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    Succeeded,
    Failed,
    /// CREATED, EXECUTING, PENDING, or anything else the server echoes
    Pending,
}

impl TaskPhase {
    pub fn of(status: &str) -> Self {
        match status {
            TASK_SUCCESS => TaskPhase::Succeeded,
            TASK_FAILED | TASK_DELETED => TaskPhase::Failed,
            _ => TaskPhase::Pending,
        }
    }
}

/// Poll a job until SUCCESS, FAILED, or DELETED
///
/// A job that is missing from the response (or not found) is treated as not
/// yet visible and polled again until the deadline.
pub async fn wait_for_task<R>(refresh: &R, task_id: &str, options: &WaitOptions) -> Result<Task>
where
    R: Refresh<Output = Task> + ?Sized,
{
    let mut last_state = String::from("NOT VISIBLE");
    let outcome = timeout(
        options.timeout,
        poll_task(refresh, task_id, options, &mut last_state),
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

async fn poll_task<R>(
    refresh: &R,
    task_id: &str,
    options: &WaitOptions,
    last_state: &mut String,
) -> Result<Task>
where
    R: Refresh<Output = Task> + ?Sized,
{
    sleep(options.timing.delay).await;

    loop {
        match refresh.refresh().await {
            Ok(snapshot) => match snapshot.object {
                Some(task) => {
                    last_state.clone_from(&snapshot.state);
                    match TaskPhase::of(&snapshot.state) {
                        TaskPhase::Succeeded => {
                            tracing::debug!("Task {} succeeded", task_id);
                            return Ok(task);
                        }
                        TaskPhase::Failed => {
                            return Err(ReconcileError::TaskFailed {
                                task_id: task_id.to_string(),
                                status: snapshot.state,
                            });
                        }
                        TaskPhase::Pending => {
                            tracing::debug!("Task {} is {}", task_id, snapshot.state);
                        }
                    }
                }
                None => tracing::debug!("Task {} is not visible yet", task_id),
            },
            Err(FetchError::NotFound(_)) => {
                tracing::debug!("Task {} is not visible yet", task_id);
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
    use crate::refresh::Snapshot;
    use crate::transport::TransportError;
    use std::time::Duration;

    fn task(status: &str) -> std::result::Result<Snapshot<Task>, FetchError> {
        Ok(Snapshot::new(
            Task {
                id: "job-123".to_string(),
                name: "kafkaConfigModify".to_string(),
                status: status.to_string(),
                params: None,
            },
            status,
        ))
    }

    fn options() -> WaitOptions {
        WaitOptions::new(PollTiming::from_secs(1, 5), Duration::from_secs(300))
    }

    #[test]
    fn test_phase() {
        assert_eq!(TaskPhase::of("SUCCESS"), TaskPhase::Succeeded);
        assert_eq!(TaskPhase::of("FAILED"), TaskPhase::Failed);
        assert_eq!(TaskPhase::of("DELETED"), TaskPhase::Failed);
        assert_eq!(TaskPhase::of("CREATED"), TaskPhase::Pending);
        assert_eq!(TaskPhase::of("EXECUTING"), TaskPhase::Pending);
        assert_eq!(TaskPhase::of("whatever-the-server-says"), TaskPhase::Pending);
    }

    #[test]
    fn test_deserialize_aliases() {
        let from_job: Task =
            serde_json::from_str(r#"{"job_id":"j-1","status":"CREATED"}"#).unwrap();
        let from_list: Task =
            serde_json::from_str(r#"{"id":"j-2","name":"restart","status":"SUCCESS"}"#).unwrap();
        assert_eq!(from_job.id, "j-1");
        assert_eq!(from_job.name, "");
        assert_eq!(from_list.phase(), TaskPhase::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_executing() {
        let refresh = Scripted::new(vec![task("CREATED"), task("EXECUTING"), task("SUCCESS")]);

        let done = wait_for_task(&refresh, "job-123", &options()).await.unwrap();

        assert_eq!(done.status, "SUCCESS");
        assert_eq!(refresh.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_and_deleted_are_terminal() {
        for status in ["FAILED", "DELETED"] {
            let refresh = Scripted::new(vec![task("EXECUTING"), task(status)]);

            let err = wait_for_task(&refresh, "job-123", &options())
                .await
                .unwrap_err();

            assert_eq!(err.kind(), ErrorKind::TaskFailed);
            match err {
                ReconcileError::TaskFailed { task_id, status: s } => {
                    assert_eq!(task_id, "job-123");
                    assert_eq!(s, status);
                }
                other => panic!("expected task failure, got {:?}", other),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_keeps_polling_until_timeout() {
        let refresh = Scripted::new(vec![task("QUEUED_SOMEWHERE")]);

        let err = wait_for_task(&refresh, "job-123", &options())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Timeout { ref last_state, .. } if last_state == "QUEUED_SOMEWHERE"
        ));
        assert!(refresh.calls() > 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_yet_visible_is_pending() {
        let refresh = Scripted::new(vec![
            Ok(Snapshot::missing("NOT VISIBLE")),
            Err(TransportError::status(404, "{}").into()),
            task("SUCCESS"),
        ]);

        let done = wait_for_task(&refresh, "job-123", &options()).await.unwrap();
        assert_eq!(done.id, "job-123");
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_error_aborts() {
        let refresh = Scripted::new(vec![
            task("EXECUTING"),
            Err(TransportError::status(500, "internal").into()),
        ]);

        let err = wait_for_task(&refresh, "job-123", &options())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
    }
}
