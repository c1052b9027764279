//! Instance operations
//!
//! Every public method runs as one reconciled operation with the deadline
//! from [`Timeouts`](crate::timing::Timeouts). Compound flows such as
//! [`KafkaService::wait_created`] run their follow-up steps inside the same
//! operation so they share that deadline.

use crate::error::{KafkaError, Result};
use crate::model::{
    ConfigParam, InstanceInfo, InstanceUpdate, NetworkBindingSet, ParameterUpdate,
    PortProtocolSwitch, ResizeRequest,
};
use crate::refresh::{
    BrokerBindings, InstanceStatus, JobStatus, NamedTask, PENDING, ResizeProgress,
};
use crate::service::KafkaService;
use crate::timing::{self, RUNNING};
use dmsflow_reconcile::{
    DELETED, Operation, PollTiming, StateTarget, Task, Transport, TransportError,
};

/// Job name of auto-topic changes, which do not return a job ID
pub const CONFIG_MODIFY_TASK: &str = "kafkaConfigModify";

impl<T: Transport> KafkaService<T> {
    /// Wait for a freshly created instance to come up
    ///
    /// Waits CREATING -> RUNNING and for the first listener bindings. When
    /// `advertised_ips` or `parameters` are given they are applied
    /// afterwards, including a restart if a static parameter changed.
    pub async fn wait_created(
        &self,
        instance_id: &str,
        advertised_ips: &[String],
        parameters: &[ConfigParam],
    ) -> Result<InstanceInfo> {
        let orchestrator = self.orchestrator(self.timeouts().create);
        let op = orchestrator.begin(format!("create {}", instance_id));

        let status = InstanceStatus::new(&self.api, instance_id);
        let snapshot = op
            .wait_for_state_every(
                &status,
                &StateTarget::new(["CREATING"], [RUNNING]),
                timing::CREATE_STATE,
            )
            .await?;

        let bindings = BrokerBindings::new(&self.api, instance_id);
        let bound = op
            .wait_for_readiness_every(
                &bindings,
                |set: &NetworkBindingSet| !set.is_empty(),
                timing::BINDINGS,
            )
            .await?;

        if !advertised_ips.is_empty() {
            self.rebind_in(&op, instance_id, &bound, advertised_ips)
                .await?;
        }
        if !parameters.is_empty() {
            self.initialize_in(&op, instance_id, parameters).await?;
        }

        let current = op.fetch(&status).await?;

        op.finish();
        Ok(current
            .into_object()
            .or_else(|| snapshot.into_object())
            .unwrap_or_default())
    }

    /// Resize an instance and wait until the new size is live
    ///
    /// Horizontal resizes additionally wait until every broker, old and new,
    /// has a listener binding.
    pub async fn resize(
        &self,
        instance_id: &str,
        request: &ResizeRequest,
    ) -> Result<InstanceInfo> {
        let orchestrator = self.orchestrator(self.timeouts().update);
        let op = orchestrator.begin(format!(
            "resize {} ({})",
            instance_id,
            request.oper_type()
        ));

        let status = InstanceStatus::new(&self.api, instance_id);
        let current = op
            .fetch(&status)
            .await?
            .into_object()
            .unwrap_or_default();
        request.validate_against(&current)?;

        let accepted = op
            .submit(
                || self.api.resize(instance_id, request),
                &status,
                &timing::stable(),
            )
            .await?;
        tracing::debug!("Resize accepted, job: {}", accepted.job_id);

        let progress = ResizeProgress::new(&self.api, instance_id, request);
        let snapshot = op
            .wait_for_state_every(
                &progress,
                &StateTarget::new([PENDING, "EXTENDING"], [RUNNING]),
                timing::RESIZE_STATE,
            )
            .await?;

        if let Some(expected) = request.expected_brokers() {
            let bindings = BrokerBindings::new(&self.api, instance_id);
            op.wait_for_readiness_every(
                &bindings,
                |set: &NetworkBindingSet| set.is_complete(expected),
                timing::BINDINGS,
            )
            .await?;
        }

        op.finish();
        Ok(snapshot.into_object().unwrap_or(current))
    }

    /// Point listeners at new advertised addresses
    ///
    /// Listeners are matched in IP order; missing or empty entries keep the
    /// listener's own address.
    pub async fn update_advertised_ips(
        &self,
        instance_id: &str,
        advertised_ips: &[String],
    ) -> Result<()> {
        let orchestrator = self.orchestrator(self.timeouts().update);
        let op = orchestrator.begin(format!("update advertised IPs of {}", instance_id));

        let bindings = op
            .fetch(&BrokerBindings::new(&self.api, instance_id))
            .await?
            .into_object()
            .unwrap_or_default();
        self.rebind_in(&op, instance_id, &bindings, advertised_ips)
            .await?;

        op.finish();
        Ok(())
    }

    /// Change broker parameters and wait for the job
    ///
    /// Static parameters need a restart to take effect; the caller decides
    /// whether to issue one through [`KafkaService::restart`].
    pub async fn modify_parameters(
        &self,
        instance_id: &str,
        params: &[ConfigParam],
    ) -> Result<ParameterUpdate> {
        let orchestrator = self.orchestrator(self.timeouts().update);
        let op = orchestrator.begin(format!("modify parameters of {}", instance_id));

        let update = self.modify_in(&op, instance_id, params).await?;
        if update.requires_restart {
            tracing::warn!(
                "Static parameters of {} changed, a restart is required to apply them",
                instance_id
            );
        }

        op.finish();
        Ok(update)
    }

    /// Modify parameters and restart when a static one changed
    pub async fn initialize_parameters(
        &self,
        instance_id: &str,
        params: &[ConfigParam],
    ) -> Result<ParameterUpdate> {
        let orchestrator = self.orchestrator(self.timeouts().update);
        let op = orchestrator.begin(format!("initialize parameters of {}", instance_id));

        let update = self.initialize_in(&op, instance_id, params).await?;

        op.finish();
        Ok(update)
    }

    pub async fn restart(&self, instance_id: &str) -> Result<InstanceInfo> {
        let orchestrator = self.orchestrator(self.timeouts().update);
        let op = orchestrator.begin(format!("restart {}", instance_id));

        let instance = self.restart_in(&op, instance_id).await?;

        op.finish();
        Ok(instance)
    }

    /// Toggle automatic topic creation and wait for the config job
    pub async fn set_auto_topic(&self, instance_id: &str, enable: bool) -> Result<Task> {
        let orchestrator = self.orchestrator(self.timeouts().update);
        let op = orchestrator.begin(format!(
            "set auto topic of {} to {}",
            instance_id, enable
        ));

        let status = InstanceStatus::new(&self.api, instance_id);
        op.submit(
            || self.api.update_auto_topic(instance_id, enable),
            &status,
            &timing::stable(),
        )
        .await?;

        let named = NamedTask::new(&self.api, instance_id, CONFIG_MODIFY_TASK);
        let task = op
            .wait_for_task_every(&named, CONFIG_MODIFY_TASK, timing::JOB)
            .await?;

        op.finish();
        Ok(task)
    }

    /// Enable or disable one listener protocol
    pub async fn switch_port_protocol(
        &self,
        instance_id: &str,
        switch: &PortProtocolSwitch,
    ) -> Result<Task> {
        switch.validate()?;

        let orchestrator = self.orchestrator(self.timeouts().update);
        let op = orchestrator.begin(format!(
            "switch {} of {}",
            switch.protocol, instance_id
        ));

        let status = InstanceStatus::new(&self.api, instance_id);
        let accepted = op
            .submit_every(
                || self.api.switch_port_protocol(instance_id, switch),
                &status,
                &timing::stable(),
                timing::STABILIZE_SLOW,
            )
            .await?;
        if accepted.job_id.is_empty() {
            return Err(KafkaError::MissingJobId(format!(
                "switch {} of {}",
                switch.protocol, instance_id
            )));
        }

        let job = JobStatus::new(&self.api, instance_id, &accepted.job_id);
        let task = op
            .wait_for_task_every(&job, &accepted.job_id, timing::PORT_PROTOCOL_JOB)
            .await?;

        op.finish();
        Ok(task)
    }

    /// Update name, description, maintenance window and similar attributes
    pub async fn update_instance(&self, instance_id: &str, update: &InstanceUpdate) -> Result<()> {
        if update.is_empty() {
            tracing::debug!("Nothing to update on {}", instance_id);
            return Ok(());
        }

        let orchestrator = self.orchestrator(self.timeouts().update);
        let op = orchestrator.begin(format!("update {}", instance_id));

        let status = InstanceStatus::new(&self.api, instance_id);
        op.submit(
            || self.api.update_instance(instance_id, update),
            &status,
            &timing::stable(),
        )
        .await?;

        op.finish();
        Ok(())
    }

    pub async fn reset_password(&self, instance_id: &str, new_password: &str) -> Result<()> {
        let orchestrator = self.orchestrator(self.timeouts().update);
        let op = orchestrator.begin(format!("reset password of {}", instance_id));

        let status = InstanceStatus::new(&self.api, instance_id);
        op.submit(
            || self.api.reset_password(instance_id, new_password),
            &status,
            &timing::stable(),
        )
        .await?;

        op.finish();
        Ok(())
    }

    /// Delete an instance and wait until it is gone
    ///
    /// An instance that is already gone counts as deleted.
    pub async fn delete(&self, instance_id: &str) -> Result<()> {
        let orchestrator = self.orchestrator(self.timeouts().delete);
        let op = orchestrator.begin(format!("delete {}", instance_id));

        let status = InstanceStatus::new(&self.api, instance_id);
        let present = op
            .submit(
                || self.delete_if_present(instance_id),
                &status,
                &timing::stable(),
            )
            .await?;

        if present {
            op.wait_for_state_every(
                &status,
                &StateTarget::new(["DELETING", RUNNING, "ERROR"], [DELETED]),
                timing::DELETE_STATE,
            )
            .await?;
        } else {
            tracing::info!("Instance {} is already gone", instance_id);
        }

        op.finish();
        Ok(())
    }

    /// Wait for an instance to reach one of `target`
    pub async fn wait_instance(
        &self,
        instance_id: &str,
        states: &StateTarget,
        timing: PollTiming,
    ) -> Result<InstanceInfo> {
        let orchestrator = self.orchestrator(self.timeouts().update);
        let op = orchestrator.begin(format!("wait for {}", instance_id));

        let status = InstanceStatus::new(&self.api, instance_id);
        let snapshot = op.wait_for_state_every(&status, states, timing).await?;

        op.finish();
        Ok(snapshot.into_object().unwrap_or_default())
    }

    /// Wait for a job started by an earlier call
    pub async fn wait_job(&self, instance_id: &str, job_id: &str) -> Result<Task> {
        let orchestrator = self.orchestrator(self.timeouts().update);
        let op = orchestrator.begin(format!("wait for job {}", job_id));

        let job = JobStatus::new(&self.api, instance_id, job_id);
        let task = op.wait_for_task(&job, job_id).await?;

        op.finish();
        Ok(task)
    }

    async fn delete_if_present(
        &self,
        instance_id: &str,
    ) -> std::result::Result<bool, TransportError> {
        match self.api.delete_instance(instance_id).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn rebind_in(
        &self,
        op: &Operation<'_>,
        instance_id: &str,
        bindings: &NetworkBindingSet,
        advertised_ips: &[String],
    ) -> Result<()> {
        let contents = bindings.rebind(advertised_ips);
        tracing::debug!("Advertised IP contents of {}: {:?}", instance_id, contents);

        let status = InstanceStatus::new(&self.api, instance_id);
        let result = op
            .submit_every(
                || self.api.update_cross_vpc(instance_id, &contents),
                &status,
                &timing::stable(),
                timing::STABILIZE_SLOW,
            )
            .await?;

        let failed = result.failed_listeners();
        if !failed.is_empty() {
            return Err(KafkaError::AdvertisedIpUpdateFailed(failed));
        }
        Ok(())
    }

    async fn modify_in(
        &self,
        op: &Operation<'_>,
        instance_id: &str,
        params: &[ConfigParam],
    ) -> Result<ParameterUpdate> {
        let status = InstanceStatus::new(&self.api, instance_id);
        let response = op
            .submit_every(
                || self.api.modify_configs(instance_id, params),
                &status,
                &timing::stable(),
                timing::STABILIZE_SLOW,
            )
            .await?;

        let update = ParameterUpdate::from(response);
        if update.job_id.is_empty() {
            return Err(KafkaError::MissingJobId(format!(
                "modify parameters of {}",
                instance_id
            )));
        }

        let job = JobStatus::new(&self.api, instance_id, &update.job_id);
        op.wait_for_task_every(&job, &update.job_id, timing::PARAMETER_JOB)
            .await?;
        Ok(update)
    }

    async fn initialize_in(
        &self,
        op: &Operation<'_>,
        instance_id: &str,
        params: &[ConfigParam],
    ) -> Result<ParameterUpdate> {
        let update = self.modify_in(op, instance_id, params).await?;
        if update.requires_restart {
            tracing::info!("Restarting {} to apply static parameters", instance_id);
            self.restart_in(op, instance_id).await?;
        }
        Ok(update)
    }

    async fn restart_in(&self, op: &Operation<'_>, instance_id: &str) -> Result<InstanceInfo> {
        let status = InstanceStatus::new(&self.api, instance_id);
        op.submit_every(
            || self.api.restart(instance_id),
            &status,
            &timing::stable(),
            timing::STABILIZE_SLOW,
        )
        .await?;

        let snapshot = op
            .wait_for_state_every(
                &status,
                &StateTarget::new(["RESTARTING"], [RUNNING]),
                timing::RESTART_STATE,
            )
            .await?;
        Ok(snapshot.into_object().unwrap_or_default())
    }
}
