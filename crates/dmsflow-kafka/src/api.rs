//! Typed DMS Kafka endpoints
//!
//! Every call is a single request. Retrying and waiting live in the service
//! layer; these methods only shape requests and decode responses.

use crate::model::{
    ClientQuota, ConfigParam, CrossVpcUpdateResult, InstanceInfo, InstanceUpdate, JobAccepted,
    ModifyConfigResponse, PortProtocolSwitch, ResizeRequest,
};
use dmsflow_reconcile::{Request, Task, Transport, TransportError};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeMap;

type ApiResult<T> = std::result::Result<T, TransportError>;

pub fn instance_path(instance_id: &str) -> String {
    format!("v2/{{project_id}}/instances/{}", instance_id)
}

pub fn tasks_path(instance_id: &str) -> String {
    format!("{}/tasks", instance_path(instance_id))
}

pub fn task_path(instance_id: &str, task_id: &str) -> String {
    format!("{}/tasks/{}", instance_path(instance_id), task_id)
}

pub fn connector_tasks_path(instance_id: &str) -> String {
    format!("{}/connector/tasks", instance_path(instance_id))
}

pub fn connector_task_path(instance_id: &str, task_id: &str) -> String {
    format!("{}/{}", connector_tasks_path(instance_id), task_id)
}

pub fn quota_path(instance_id: &str) -> String {
    format!(
        "v2/kafka/{{project_id}}/instances/{}/kafka-user-client-quota",
        instance_id
    )
}

pub fn port_protocol_path(instance_id: &str) -> String {
    format!(
        "v2/{{project_id}}/kafka/instances/{}/plain-ssl-switch",
        instance_id
    )
}

pub const INSTANCE_ACTION_PATH: &str = "v2/{project_id}/instances/action";

fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
}

/// DMS Kafka API over any [`Transport`]
pub struct KafkaApi<T> {
    transport: T,
}

impl<T: Transport> KafkaApi<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get_instance(&self, instance_id: &str) -> ApiResult<InstanceInfo> {
        let body = self
            .transport
            .send(Request::get(instance_path(instance_id)))
            .await?;
        decode(body)
    }

    pub async fn update_instance(&self, instance_id: &str, update: &InstanceUpdate) -> ApiResult<()> {
        let body = serde_json::to_value(update).map_err(|e| TransportError::Decode(e.to_string()))?;
        self.transport
            .send(Request::put(instance_path(instance_id)).with_body(body))
            .await?;
        Ok(())
    }

    pub async fn delete_instance(&self, instance_id: &str) -> ApiResult<()> {
        self.transport
            .send(Request::delete(instance_path(instance_id)))
            .await?;
        Ok(())
    }

    pub async fn resize(&self, instance_id: &str, request: &ResizeRequest) -> ApiResult<JobAccepted> {
        let body = self
            .transport
            .send(
                Request::post(format!("{}/extend", instance_path(instance_id)))
                    .with_body(request.body()),
            )
            .await?;
        // some regions answer with an empty body
        if body.is_null() {
            return Ok(JobAccepted::default());
        }
        decode(body)
    }

    pub async fn restart(&self, instance_id: &str) -> ApiResult<Value> {
        self.transport
            .send(Request::post(INSTANCE_ACTION_PATH).with_body(json!({
                "action": "restart",
                "instances": [instance_id],
            })))
            .await
    }

    pub async fn modify_configs(
        &self,
        instance_id: &str,
        params: &[ConfigParam],
    ) -> ApiResult<ModifyConfigResponse> {
        let body = self
            .transport
            .send(
                Request::put(format!("{}/configs", instance_path(instance_id)))
                    .with_body(json!({ "kafka_configs": params })),
            )
            .await?;
        decode(body)
    }

    pub async fn update_cross_vpc(
        &self,
        instance_id: &str,
        contents: &BTreeMap<String, String>,
    ) -> ApiResult<CrossVpcUpdateResult> {
        let body = self
            .transport
            .send(
                Request::put(format!("{}/crossvpc/modify", instance_path(instance_id)))
                    .with_body(json!({ "contents": contents })),
            )
            .await?;
        decode(body)
    }

    pub async fn update_auto_topic(&self, instance_id: &str, enable: bool) -> ApiResult<()> {
        self.transport
            .send(
                Request::post(format!("{}/autotopic", instance_path(instance_id)))
                    .with_body(json!({ "enable_auto_topic": enable })),
            )
            .await?;
        Ok(())
    }

    pub async fn reset_password(&self, instance_id: &str, new_password: &str) -> ApiResult<()> {
        self.transport
            .send(
                Request::put(format!("{}/password", instance_path(instance_id)))
                    .with_body(json!({ "new_password": new_password })),
            )
            .await?;
        Ok(())
    }

    pub async fn switch_port_protocol(
        &self,
        instance_id: &str,
        switch: &PortProtocolSwitch,
    ) -> ApiResult<JobAccepted> {
        let body = self
            .transport
            .send(Request::post(port_protocol_path(instance_id)).with_body(switch.body()))
            .await?;
        decode(body)
    }

    /// Job by ID; `None` while the job is not listed yet
    pub async fn get_task(&self, instance_id: &str, task_id: &str) -> ApiResult<Option<Task>> {
        let body = self
            .transport
            .send(Request::get(task_path(instance_id, task_id)))
            .await?;
        first_task(&body, |task| listed_id(task) == Some(task_id))
    }

    /// Most recent job with the given name
    pub async fn find_task(&self, instance_id: &str, name: &str) -> ApiResult<Option<Task>> {
        let body = self
            .transport
            .send(Request::get(tasks_path(instance_id)))
            .await?;
        first_task(&body, |task| task["name"] == name)
    }

    pub async fn create_quota(&self, instance_id: &str, quota: &ClientQuota) -> ApiResult<JobAccepted> {
        self.send_quota(Request::post(quota_path(instance_id)), quota)
            .await
    }

    pub async fn update_quota(&self, instance_id: &str, quota: &ClientQuota) -> ApiResult<JobAccepted> {
        self.send_quota(Request::put(quota_path(instance_id)), quota)
            .await
    }

    pub async fn delete_quota(&self, instance_id: &str, quota: &ClientQuota) -> ApiResult<JobAccepted> {
        self.send_quota(Request::delete(quota_path(instance_id)), quota)
            .await
    }

    async fn send_quota(&self, request: Request, quota: &ClientQuota) -> ApiResult<JobAccepted> {
        let body = serde_json::to_value(quota).map_err(|e| TransportError::Decode(e.to_string()))?;
        let body = self.transport.send(request.with_body(body)).await?;
        decode(body)
    }

    /// Create a smart-connect task; returns the raw response (carries `id`)
    pub async fn create_connector_task(
        &self,
        instance_id: &str,
        definition: &Value,
    ) -> ApiResult<Value> {
        self.transport
            .send(Request::post(connector_tasks_path(instance_id)).with_body(definition.clone()))
            .await
    }

    pub async fn get_connector_task(&self, instance_id: &str, task_id: &str) -> ApiResult<Value> {
        self.transport
            .send(Request::get(connector_task_path(instance_id, task_id)))
            .await
    }

    pub async fn delete_connector_task(&self, instance_id: &str, task_id: &str) -> ApiResult<()> {
        self.transport
            .send(Request::delete(connector_task_path(instance_id, task_id)))
            .await?;
        Ok(())
    }
}

/// ID of a listed job, under whichever key the endpoint uses
fn listed_id(task: &Value) -> Option<&str> {
    ["id", "job_id", "task_id"]
        .iter()
        .find_map(|key| task.get(*key).and_then(Value::as_str))
}

fn first_task<F>(body: &Value, matches: F) -> ApiResult<Option<Task>>
where
    F: Fn(&Value) -> bool,
{
    let Some(tasks) = body.get("tasks").and_then(Value::as_array) else {
        return Ok(None);
    };
    tasks
        .iter()
        .find(|task| matches(task))
        .map(|task| decode(task.clone()))
        .transpose()
}
