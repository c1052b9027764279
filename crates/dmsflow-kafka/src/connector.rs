//! Smart-connect task operations

use crate::error::{KafkaError, Result};
use crate::refresh::{ConnectorTaskStatus, InstanceStatus};
use crate::service::KafkaService;
use crate::timing::{self, RUNNING};
use dmsflow_reconcile::{StateTarget, Transport, TransportError};
use serde_json::Value;

/// Status of a connector task that is set up but has no work yet
pub const WAITING: &str = "WAITING";

impl<T: Transport> KafkaService<T> {
    /// Create a smart-connect task and wait for it to run
    ///
    /// Returns the ID of the new task together with its last fetched body.
    pub async fn create_connector_task(
        &self,
        instance_id: &str,
        definition: &Value,
    ) -> Result<(String, Value)> {
        let orchestrator = self.orchestrator(self.timeouts().connector);
        let op = orchestrator.begin(format!("create connector task on {}", instance_id));

        let status = InstanceStatus::new(&self.api, instance_id);
        let created = op
            .submit(
                || self.api.create_connector_task(instance_id, definition),
                &status,
                &timing::stable(),
            )
            .await?;
        let task_id = created["id"]
            .as_str()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                KafkaError::MissingTaskId(format!("create connector task on {}", instance_id))
            })?
            .to_string();
        tracing::debug!("Connector task created: {}", task_id);

        let task = ConnectorTaskStatus::new(&self.api, instance_id, &task_id);
        let snapshot = op
            .wait_for_state_every(
                &task,
                &StateTarget::new(["CREATING"], [RUNNING, WAITING]),
                timing::CONNECTOR_TASK,
            )
            .await?;

        op.finish();
        Ok((task_id, snapshot.into_object().unwrap_or_default()))
    }

    /// Delete a smart-connect task; a task that is already gone counts as deleted
    pub async fn delete_connector_task(&self, instance_id: &str, task_id: &str) -> Result<()> {
        let orchestrator = self.orchestrator(self.timeouts().connector);
        let op = orchestrator.begin(format!("delete connector task {}", task_id));

        let status = InstanceStatus::new(&self.api, instance_id);
        let present = op
            .submit(
                || self.delete_connector_if_present(instance_id, task_id),
                &status,
                &timing::stable(),
            )
            .await?;
        if !present {
            tracing::info!("Connector task {} is already gone", task_id);
        }

        op.finish();
        Ok(())
    }

    async fn delete_connector_if_present(
        &self,
        instance_id: &str,
        task_id: &str,
    ) -> std::result::Result<bool, TransportError> {
        match self.api.delete_connector_task(instance_id, task_id).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}
