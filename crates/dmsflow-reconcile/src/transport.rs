//! Transport seam
//!
//! The core never builds HTTP clients itself. It consumes whatever JSON tree
//! the transport layer has already deserialized, and inspects failed
//! responses through [`TransportError`].

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// HTTP method of a control-plane request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A single control-plane request
///
/// `path` is relative to the service endpoint and may contain a
/// `{project_id}` placeholder that the transport fills in.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Failure of a single transport call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The server answered with a non-success status code
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The server could not be reached at all
    #[error("connection error: {0}")]
    Connection(String),

    /// The server answered, but the body was not valid JSON
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        TransportError::Status {
            status,
            body: body.into(),
        }
    }

    /// HTTP status code, if the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body, if the server answered
    pub fn body(&self) -> Option<&str> {
        match self {
            TransportError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// Provider error code from a JSON error body, when one is present
    pub fn error_code(&self) -> Option<String> {
        let body: Value = serde_json::from_str(self.body()?).ok()?;
        body.get("error_code")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Issues one request and returns the decoded JSON body
///
/// Empty success bodies decode to [`Value::Null`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: Request) -> Result<Value, TransportError> {
        (**self).send(request).await
    }
}
