//! DMS Kafka operations for DMSFlow
//!
//! Drives instance, quota and smart-connect mutations of the DMS Kafka
//! control plane through the reconciliation core, so that each call returns
//! only once the remote side has settled.
//!
//! # Features
//!
//! - Instance create wait, resize (flavor, storage, brokers), restart, delete
//! - Advertised IP rebind and broker parameter changes
//! - User/client quotas
//! - Smart-connect tasks
//!
//! # Example
//!
//! ```ignore
//! use dmsflow_kafka::{ClientConfig, DmsClient, KafkaService, ResizeRequest};
//!
//! let client = DmsClient::new(ClientConfig::from_env()?)?;
//! let service = KafkaService::new(client);
//!
//! let instance = service.resize("inst-1", &ResizeRequest::brokers(5)).await?;
//! println!("{} now has {} brokers", instance.name, instance.broker_num);
//! ```

pub mod api;
pub mod client;
pub mod connector;
pub mod error;
pub mod instance;
pub mod model;
pub mod quota;
pub mod refresh;
pub mod service;
pub mod timing;

pub use api::KafkaApi;
pub use client::{ClientConfig, DmsClient};
pub use error::{KafkaError, Result};
pub use instance::CONFIG_MODIFY_TASK;
pub use model::{
    ClientQuota, ConfigParam, CrossVpcEntry, InstanceInfo, InstanceUpdate, NetworkBindingSet,
    ParameterUpdate, PortProtocolSwitch, ResizeRequest,
};
pub use service::KafkaService;
pub use timing::Timeouts;
