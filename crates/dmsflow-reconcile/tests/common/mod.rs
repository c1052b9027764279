use async_trait::async_trait;
use dmsflow_reconcile::{FetchError, Method, Request, Snapshot, Task, Transport, TransportError};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type Reply = Result<Value, TransportError>;

/// In-memory control plane
///
/// Each route replays its scripted replies in order and then keeps repeating
/// the last one. Unscripted routes answer 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    log: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, path: &str, replies: Vec<Reply>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(key(method, path), replies.into());
        self
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().unwrap().clone()
    }
}

fn key(method: Method, path: &str) -> String {
    format!("{} {}", method, path)
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<Value, TransportError> {
        let route = key(request.method, &request.path);
        self.log.lock().unwrap().push(request);

        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&route) {
            Some(replies) if replies.len() > 1 => replies.pop_front().unwrap(),
            Some(replies) => replies.front().cloned().unwrap(),
            None => Err(TransportError::status(
                404,
                r#"{"error_code":"DMS.00404022","error_msg":"not found"}"#,
            )),
        }
    }
}

pub fn status(s: &str) -> Reply {
    Ok(json!({ "instance_id": "inst-1", "status": s }))
}

#[allow(dead_code)]
pub fn job(status: &str) -> Reply {
    Ok(json!({ "tasks": [{ "id": "job-123", "name": "kafkaInstanceResize", "status": status }] }))
}

pub fn busy() -> Reply {
    Err(TransportError::status(
        400,
        r#"{"error_code":"DMS.00400026","error_msg":"instance status does not allow this operation"}"#,
    ))
}

pub async fn instance_snapshot(
    transport: &MockTransport,
    path: &str,
) -> Result<Snapshot<Value>, FetchError> {
    let body = transport.send(Request::get(path)).await?;
    let state = body["status"].as_str().unwrap_or_default().to_string();
    Ok(Snapshot::new(body, state))
}

#[allow(dead_code)]
pub async fn task_snapshot(
    transport: &MockTransport,
    path: &str,
) -> Result<Snapshot<Task>, FetchError> {
    let body = transport.send(Request::get(path)).await?;
    match body["tasks"].get(0) {
        Some(task) => {
            let task: Task = serde_json::from_value(task.clone())?;
            let state = task.status.clone();
            Ok(Snapshot::new(task, state))
        }
        None => Ok(Snapshot::missing("NOT VISIBLE")),
    }
}
