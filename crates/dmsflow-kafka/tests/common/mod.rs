use async_trait::async_trait;
use dmsflow_reconcile::{Method, Request, Transport, TransportError};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

pub type Reply = Result<Value, TransportError>;

pub const INSTANCE: &str = "v2/{project_id}/instances/inst-1";

/// Scripted DMS endpoint
///
/// Each route replays its replies in order and then keeps repeating the last
/// one. Unscripted routes answer 404.
#[derive(Default)]
pub struct MockDms {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    log: Mutex<Vec<Request>>,
}

impl MockDms {
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
        self.sent(method, path).len()
    }

    /// Requests sent to one route, oldest first
    pub fn sent(&self, method: Method, path: &str) -> Vec<Request> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }
}

fn key(method: Method, path: &str) -> String {
    format!("{} {}", method, path)
}

#[async_trait]
impl Transport for MockDms {
    async fn send(&self, request: Request) -> Result<Value, TransportError> {
        let route = key(request.method, &request.path);
        self.log.lock().unwrap().push(request);

        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&route) {
            Some(replies) if replies.len() > 1 => replies.pop_front().unwrap(),
            Some(replies) => replies.front().cloned().unwrap(),
            None => Err(not_found()),
        }
    }
}

pub fn not_found() -> TransportError {
    TransportError::status(
        404,
        r#"{"error_code":"DMS.00404022","error_msg":"The instance does not exist."}"#,
    )
}

/// Instance with `listeners` bound brokers out of `broker_num`
pub fn instance(status: &str, broker_num: u32, listeners: usize) -> Reply {
    let cross_vpc: BTreeMap<String, Value> = (1..=listeners)
        .map(|i| {
            let ip = format!("10.0.0.{}", i);
            (ip.clone(), json!({ "advertised_ip": ip, "port": 9011 }))
        })
        .collect();
    let cross_vpc_info = if cross_vpc.is_empty() {
        String::new()
    } else {
        serde_json::to_string(&cross_vpc).unwrap()
    };

    Ok(json!({
        "instance_id": "inst-1",
        "name": "kafka-orders",
        "status": status,
        "broker_num": broker_num,
        "total_storage_space": 600,
        "product_id": "c6.2u4g.cluster",
        "cross_vpc_info": cross_vpc_info,
    }))
}

#[allow(dead_code)]
pub fn task(id: &str, name: &str, status: &str) -> Reply {
    Ok(json!({ "tasks": [{ "id": id, "name": name, "status": status }] }))
}

#[allow(dead_code)]
pub fn busy() -> Reply {
    Err(TransportError::status(
        400,
        r#"{"error_code":"DMS.00400026","error_msg":"This operation is not allowed due to the instance status."}"#,
    ))
}
