//! DMS API client
//!
//! Thin reqwest-based [`Transport`]: authenticates with an IAM token, fills
//! in the project ID, and hands back the decoded JSON body.

use crate::error::{KafkaError, Result};
use async_trait::async_trait;
use dmsflow_config::Settings;
use dmsflow_reconcile::{Method, Request, Transport, TransportError};
use serde_json::Value;

const AUTH_HEADER: &str = "X-Auth-Token";

/// Connection settings of a [`DmsClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service endpoint, e.g. `https://dms.ap-southeast-1.myhuaweicloud.com`
    pub endpoint: String,
    pub project_id: String,
    pub token: String,
}

impl ClientConfig {
    /// Create ClientConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("DMS_ENDPOINT")
            .map_err(|_| KafkaError::MissingEnvVar("DMS_ENDPOINT".to_string()))?;
        let project_id = std::env::var("DMS_PROJECT_ID")
            .map_err(|_| KafkaError::MissingEnvVar("DMS_PROJECT_ID".to_string()))?;
        let token = std::env::var("DMS_AUTH_TOKEN")
            .map_err(|_| KafkaError::MissingEnvVar("DMS_AUTH_TOKEN".to_string()))?;

        Ok(Self {
            endpoint,
            project_id,
            token,
        })
    }

    /// Create ClientConfig from a settings file; the token comes from `settings.token_env`
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let token = std::env::var(&settings.token_env)
            .map_err(|_| KafkaError::MissingEnvVar(settings.token_env.clone()))?;

        Ok(Self {
            endpoint: settings.endpoint.clone(),
            project_id: settings.project_id.clone(),
            token,
        })
    }
}

/// HTTP client for the DMS control plane
pub struct DmsClient {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
    token: String,
}

impl DmsClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(KafkaError::InvalidConfig("endpoint is empty".to_string()));
        }
        if config.project_id.is_empty() {
            return Err(KafkaError::InvalidConfig("project_id is empty".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::builder().build()?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id,
            token: config.token,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Absolute URL of a request path
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint,
            path.trim_start_matches('/')
                .replace("{project_id}", &self.project_id)
        )
    }
}

#[async_trait]
impl Transport for DmsClient {
    async fn send(&self, request: Request) -> std::result::Result<Value, TransportError> {
        let url = self.url(&request.path);
        tracing::debug!("{} {}", request.method, url);

        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        let builder = builder.header(AUTH_HEADER, &self.token);
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!("{} {} failed with {}: {}", request.method, url, status, text);
            return Err(TransportError::status(status.as_u16(), text));
        }

        decode_body(&text)
    }
}

/// Empty success bodies (204 and friends) decode to `Null`
fn decode_body(text: &str) -> std::result::Result<Value, TransportError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| TransportError::Decode(e.to_string()))
}
