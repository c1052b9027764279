//! Entry point of reconciled DMS Kafka operations

use crate::api::KafkaApi;
use crate::timing::{self, Timeouts};
use dmsflow_reconcile::{Orchestrator, ReconcileConfig, Transport};
use std::time::Duration;

/// Reconciled operations over one DMS Kafka endpoint
///
/// Operations are split by entity across `instance`, `quota` and
/// `connector`; each one submits, waits, and returns once the remote side
/// has settled or the operation deadline passes.
pub struct KafkaService<T> {
    pub(crate) api: KafkaApi<T>,
    config: ReconcileConfig,
    timeouts: Timeouts,
}

impl<T: Transport> KafkaService<T> {
    pub fn new(transport: T) -> Self {
        Self {
            api: KafkaApi::new(transport),
            config: timing::base_config(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Override base poll settings; per-operation deadlines still come from [`Timeouts`]
    pub fn with_config(mut self, config: ReconcileConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api(&self) -> &KafkaApi<T> {
        &self.api
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub(crate) fn orchestrator(&self, timeout: Duration) -> Orchestrator {
        Orchestrator::new(self.config.clone().with_timeout(timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dmsflow_reconcile::{Request, TransportError};
    use serde_json::Value;

    struct Offline;

    #[async_trait]
    impl Transport for Offline {
        async fn send(&self, _request: Request) -> Result<Value, TransportError> {
            Err(TransportError::Connection("offline".to_string()))
        }
    }

    #[test]
    fn test_orchestrator_takes_operation_timeout() {
        let service = KafkaService::new(Offline).with_timeouts(Timeouts {
            delete: Duration::from_secs(60),
            ..Timeouts::default()
        });

        let orchestrator = service.orchestrator(service.timeouts().delete);
        assert_eq!(orchestrator.config().timeout, Duration::from_secs(60));
        assert_eq!(orchestrator.config().stabilize, timing::STABILIZE);
    }
}
