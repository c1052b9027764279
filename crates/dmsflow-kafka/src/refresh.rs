//! Refresh strategies for DMS Kafka entities

use crate::api::KafkaApi;
use crate::model::{InstanceInfo, NetworkBindingSet, ResizeRequest};
use async_trait::async_trait;
use dmsflow_reconcile::{FetchError, Refresh, Snapshot, Task, Transport};
use serde_json::Value;

/// State reported while the requested size is not visible yet
pub const PENDING: &str = "PENDING";

/// State reported once the binding set satisfies the caller
pub const BOUND: &str = "BOUND";

/// Instance status
pub struct InstanceStatus<'a, T> {
    api: &'a KafkaApi<T>,
    instance_id: &'a str,
}

impl<'a, T> InstanceStatus<'a, T> {
    pub fn new(api: &'a KafkaApi<T>, instance_id: &'a str) -> Self {
        Self { api, instance_id }
    }
}

#[async_trait]
impl<'a, T: Transport> Refresh for InstanceStatus<'a, T> {
    type Output = InstanceInfo;

    async fn refresh(&self) -> Result<Snapshot<InstanceInfo>, FetchError> {
        let instance = self.api.get_instance(self.instance_id).await?;
        let state = instance.status.clone();
        Ok(Snapshot::new(instance, state))
    }
}

/// Instance status, held at PENDING until the instance reflects a resize
pub struct ResizeProgress<'a, T> {
    api: &'a KafkaApi<T>,
    instance_id: &'a str,
    request: &'a ResizeRequest,
}

impl<'a, T> ResizeProgress<'a, T> {
    pub fn new(api: &'a KafkaApi<T>, instance_id: &'a str, request: &'a ResizeRequest) -> Self {
        Self {
            api,
            instance_id,
            request,
        }
    }
}

#[async_trait]
impl<'a, T: Transport> Refresh for ResizeProgress<'a, T> {
    type Output = InstanceInfo;

    async fn refresh(&self) -> Result<Snapshot<InstanceInfo>, FetchError> {
        let instance = self.api.get_instance(self.instance_id).await?;
        if !self.request.is_reflected(&instance) {
            return Ok(Snapshot::new(instance, PENDING));
        }
        let state = instance.status.clone();
        Ok(Snapshot::new(instance, state))
    }
}

/// Listener bindings parsed from `cross_vpc_info`
pub struct BrokerBindings<'a, T> {
    api: &'a KafkaApi<T>,
    instance_id: &'a str,
}

impl<'a, T> BrokerBindings<'a, T> {
    pub fn new(api: &'a KafkaApi<T>, instance_id: &'a str) -> Self {
        Self { api, instance_id }
    }
}

#[async_trait]
impl<'a, T: Transport> Refresh for BrokerBindings<'a, T> {
    type Output = NetworkBindingSet;

    async fn refresh(&self) -> Result<Snapshot<NetworkBindingSet>, FetchError> {
        let instance = self.api.get_instance(self.instance_id).await?;
        let bindings = instance
            .bindings()
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        let state = format!("{}/{} {}", bindings.len(), bindings.broker_num, BOUND);
        Ok(Snapshot::new(bindings, state))
    }
}

/// Job looked up by ID
pub struct JobStatus<'a, T> {
    api: &'a KafkaApi<T>,
    instance_id: &'a str,
    job_id: &'a str,
}

impl<'a, T> JobStatus<'a, T> {
    pub fn new(api: &'a KafkaApi<T>, instance_id: &'a str, job_id: &'a str) -> Self {
        Self {
            api,
            instance_id,
            job_id,
        }
    }
}

#[async_trait]
impl<'a, T: Transport> Refresh for JobStatus<'a, T> {
    type Output = Task;

    async fn refresh(&self) -> Result<Snapshot<Task>, FetchError> {
        let task = self.api.get_task(self.instance_id, self.job_id).await?;
        Ok(task_snapshot(task))
    }
}

/// Most recent job with a given name, e.g. `kafkaConfigModify`
pub struct NamedTask<'a, T> {
    api: &'a KafkaApi<T>,
    instance_id: &'a str,
    name: &'a str,
}

impl<'a, T> NamedTask<'a, T> {
    pub fn new(api: &'a KafkaApi<T>, instance_id: &'a str, name: &'a str) -> Self {
        Self {
            api,
            instance_id,
            name,
        }
    }
}

#[async_trait]
impl<'a, T: Transport> Refresh for NamedTask<'a, T> {
    type Output = Task;

    async fn refresh(&self) -> Result<Snapshot<Task>, FetchError> {
        let task = self.api.find_task(self.instance_id, self.name).await?;
        Ok(task_snapshot(task))
    }
}

fn task_snapshot(task: Option<Task>) -> Snapshot<Task> {
    match task {
        Some(task) => {
            let state = task.status.clone();
            Snapshot::new(task, state)
        }
        None => Snapshot::missing("NOT VISIBLE"),
    }
}

/// Smart-connect task status
pub struct ConnectorTaskStatus<'a, T> {
    api: &'a KafkaApi<T>,
    instance_id: &'a str,
    task_id: &'a str,
}

impl<'a, T> ConnectorTaskStatus<'a, T> {
    pub fn new(api: &'a KafkaApi<T>, instance_id: &'a str, task_id: &'a str) -> Self {
        Self {
            api,
            instance_id,
            task_id,
        }
    }
}

#[async_trait]
impl<'a, T: Transport> Refresh for ConnectorTaskStatus<'a, T> {
    type Output = Value;

    async fn refresh(&self) -> Result<Snapshot<Value>, FetchError> {
        let body = self
            .api
            .get_connector_task(self.instance_id, self.task_id)
            .await?;
        let state = body["status"].as_str().unwrap_or_default().to_string();
        Ok(Snapshot::new(body, state))
    }
}
