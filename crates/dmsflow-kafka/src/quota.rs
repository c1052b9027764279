//! User/client quota operations

use crate::error::{KafkaError, Result};
use crate::model::{ClientQuota, JobAccepted};
use crate::refresh::{InstanceStatus, JobStatus};
use crate::service::KafkaService;
use crate::timing;
use dmsflow_reconcile::{Task, Transport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuotaAction {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for QuotaAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuotaAction::Create => write!(f, "create"),
            QuotaAction::Update => write!(f, "update"),
            QuotaAction::Delete => write!(f, "delete"),
        }
    }
}

impl<T: Transport> KafkaService<T> {
    pub async fn create_quota(&self, instance_id: &str, quota: &ClientQuota) -> Result<Task> {
        self.apply_quota(QuotaAction::Create, instance_id, quota)
            .await
    }

    pub async fn update_quota(&self, instance_id: &str, quota: &ClientQuota) -> Result<Task> {
        self.apply_quota(QuotaAction::Update, instance_id, quota)
            .await
    }

    pub async fn delete_quota(&self, instance_id: &str, quota: &ClientQuota) -> Result<Task> {
        self.apply_quota(QuotaAction::Delete, instance_id, quota)
            .await
    }

    async fn apply_quota(
        &self,
        action: QuotaAction,
        instance_id: &str,
        quota: &ClientQuota,
    ) -> Result<Task> {
        quota.validate()?;

        let timeout = match action {
            QuotaAction::Delete => self.timeouts().delete,
            _ => self.timeouts().update,
        };
        let orchestrator = self.orchestrator(timeout);
        let op = orchestrator.begin(format!("{} quota {}", action, quota.id(instance_id)));

        let status = InstanceStatus::new(&self.api, instance_id);
        let accepted = op
            .submit(
                || self.send_quota(action, instance_id, quota),
                &status,
                &timing::stable(),
            )
            .await?;
        if accepted.job_id.is_empty() {
            return Err(KafkaError::MissingJobId(format!(
                "{} quota {}",
                action,
                quota.id(instance_id)
            )));
        }

        let job = JobStatus::new(&self.api, instance_id, &accepted.job_id);
        let task = op
            .wait_for_task_every(&job, &accepted.job_id, timing::JOB)
            .await?;

        op.finish();
        Ok(task)
    }

    async fn send_quota(
        &self,
        action: QuotaAction,
        instance_id: &str,
        quota: &ClientQuota,
    ) -> std::result::Result<JobAccepted, TransportError> {
        match action {
            QuotaAction::Create => self.api.create_quota(instance_id, quota).await,
            QuotaAction::Update => self.api.update_quota(instance_id, quota).await,
            QuotaAction::Delete => self.api.delete_quota(instance_id, quota).await,
        }
    }
}
