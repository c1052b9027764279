//! DMS Kafka provider error types

use dmsflow_reconcile::{ErrorKind, ReconcileError, TransportError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KafkaError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}: job_id is not found in API response")]
    MissingJobId(String),

    #[error("{0}: id is not found in API response")]
    MissingTaskId(String),

    #[error("Failed to parse cross-VPC info '{raw}': {reason}")]
    CrossVpcInfo { raw: String, reason: String },

    #[error("Failed to update the advertised IPs of listener IPs {0:?}")]
    AdvertisedIpUpdateFailed(Vec<String>),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(#[from] TransportError),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl KafkaError {
    /// Reconciliation kind, when the failure came from a reconciled operation
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            KafkaError::Reconcile(err) => Some(err.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, KafkaError>;
