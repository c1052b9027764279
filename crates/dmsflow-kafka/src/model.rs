//! Wire shapes of the DMS Kafka API

use crate::error::{KafkaError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Instance as returned by `GET v2/{project_id}/instances/{instance_id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceInfo {
    #[serde(default)]
    pub instance_id: String,

    #[serde(default)]
    pub name: String,

    /// CREATING, RUNNING, ERROR, DELETING, RESTARTING, EXTENDING, ...
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub broker_num: u32,

    #[serde(default)]
    pub total_storage_space: u64,

    #[serde(default)]
    pub product_id: String,

    /// JSON-encoded map of listener IP to advertised address, empty until bound
    #[serde(default)]
    pub cross_vpc_info: String,
}

impl InstanceInfo {
    pub fn bindings(&self) -> Result<NetworkBindingSet> {
        NetworkBindingSet::from_instance(self)
    }
}

/// One listener entry of `cross_vpc_info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossVpcEntry {
    #[serde(default)]
    pub advertised_ip: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_id: Option<String>,
}

/// Listener to advertised address bindings of an instance
///
/// Listeners are kept sorted by IP, which is the order the advertised
/// addresses of an update are matched against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkBindingSet {
    pub broker_num: u32,
    pub listeners: BTreeMap<String, CrossVpcEntry>,
}

impl NetworkBindingSet {
    pub fn from_instance(instance: &InstanceInfo) -> Result<Self> {
        Ok(Self {
            broker_num: instance.broker_num,
            listeners: Self::parse(&instance.cross_vpc_info)?,
        })
    }

    /// Parse a raw `cross_vpc_info` string; an empty string means no bindings
    pub fn parse(raw: &str) -> Result<BTreeMap<String, CrossVpcEntry>> {
        if raw.is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(raw).map_err(|e| KafkaError::CrossVpcInfo {
            raw: raw.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Every one of `expected` brokers is present and bound
    ///
    /// Both the broker count and the binding count must match exactly.
    pub fn is_complete(&self, expected: u32) -> bool {
        self.broker_num == expected && self.listeners.len() == expected as usize
    }

    /// Build the `contents` map of an advertised IP update
    ///
    /// The i-th listener gets the i-th advertised address. Listeners without
    /// a (non-empty) counterpart advertise their own IP.
    pub fn rebind(&self, advertised: &[String]) -> BTreeMap<String, String> {
        self.listeners
            .keys()
            .enumerate()
            .map(|(i, listener)| {
                let target = advertised
                    .get(i)
                    .filter(|ip| !ip.is_empty())
                    .unwrap_or(listener);
                (listener.clone(), target.clone())
            })
            .collect()
    }
}

/// Kind of resize supported by `POST .../extend`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeRequest {
    /// Change the flavor (`vertical`)
    Flavor { product_id: String },

    /// Grow total storage in GB (`storage`)
    Storage { storage_space: u64 },

    /// Add brokers (`horizontal`)
    Brokers {
        broker_num: u32,
        public_ip_ids: Vec<String>,
        tenant_ips: Vec<String>,
    },
}

impl ResizeRequest {
    pub fn brokers(broker_num: u32) -> Self {
        ResizeRequest::Brokers {
            broker_num,
            public_ip_ids: Vec::new(),
            tenant_ips: Vec::new(),
        }
    }

    pub fn oper_type(&self) -> &'static str {
        match self {
            ResizeRequest::Flavor { .. } => "vertical",
            ResizeRequest::Storage { .. } => "storage",
            ResizeRequest::Brokers { .. } => "horizontal",
        }
    }

    pub fn body(&self) -> Value {
        match self {
            ResizeRequest::Flavor { product_id } => json!({
                "oper_type": self.oper_type(),
                "new_product_id": product_id,
            }),
            ResizeRequest::Storage { storage_space } => json!({
                "oper_type": self.oper_type(),
                "new_storage_space": storage_space,
            }),
            ResizeRequest::Brokers {
                broker_num,
                public_ip_ids,
                tenant_ips,
            } => {
                let mut body = json!({
                    "oper_type": self.oper_type(),
                    "new_broker_num": broker_num,
                });
                if !public_ip_ids.is_empty() {
                    body["publicip_id"] = json!(public_ip_ids.join(","));
                }
                if !tenant_ips.is_empty() {
                    body["tenant_ips"] = json!(tenant_ips);
                }
                body
            }
        }
    }

    /// Whether `instance` already shows the requested size
    pub fn is_reflected(&self, instance: &InstanceInfo) -> bool {
        match self {
            ResizeRequest::Flavor { product_id } => &instance.product_id == product_id,
            ResizeRequest::Storage { storage_space } => {
                instance.total_storage_space == *storage_space
            }
            ResizeRequest::Brokers { broker_num, .. } => instance.broker_num == *broker_num,
        }
    }

    /// Reject resizes the control plane would refuse for `current`
    ///
    /// Storage and broker count only grow. New EIPs, when given, must match
    /// the number of added brokers one to one.
    pub fn validate_against(&self, current: &InstanceInfo) -> Result<()> {
        match self {
            ResizeRequest::Flavor { product_id } if product_id.is_empty() => Err(
                KafkaError::InvalidRequest("product_id must not be empty".to_string()),
            ),
            ResizeRequest::Storage { storage_space }
                if *storage_space <= current.total_storage_space =>
            {
                Err(KafkaError::InvalidRequest(format!(
                    "storage can only grow: {} -> {}",
                    current.total_storage_space, storage_space
                )))
            }
            ResizeRequest::Brokers {
                broker_num,
                public_ip_ids,
                tenant_ips,
            } => {
                if *broker_num <= current.broker_num {
                    return Err(KafkaError::InvalidRequest(format!(
                        "broker number can only grow: {} -> {}",
                        current.broker_num, broker_num
                    )));
                }
                let added = (broker_num - current.broker_num) as usize;
                if !public_ip_ids.is_empty() && public_ip_ids.len() != added {
                    return Err(KafkaError::InvalidRequest(format!(
                        "{} EIP IDs given for {} added brokers",
                        public_ip_ids.len(),
                        added
                    )));
                }
                if tenant_ips.len() > added {
                    return Err(KafkaError::InvalidRequest(format!(
                        "{} tenant IPs given for {} added brokers",
                        tenant_ips.len(),
                        added
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Broker count the binding set must reach after this resize
    pub fn expected_brokers(&self) -> Option<u32> {
        match self {
            ResizeRequest::Brokers { broker_num, .. } => Some(*broker_num),
            _ => None,
        }
    }
}

/// Response of `PUT .../crossvpc/modify`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossVpcUpdateResult {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub results: Vec<CrossVpcListenerResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossVpcListenerResult {
    #[serde(default)]
    pub listeners_ip: String,

    #[serde(default)]
    pub advertised_ip: String,

    #[serde(default)]
    pub success: bool,
}

impl CrossVpcUpdateResult {
    pub fn failed_listeners(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.listeners_ip.clone())
            .collect()
    }
}

/// One broker parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigParam {
    pub name: String,
    pub value: String,
}

impl ConfigParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse `name=value`
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok(Self::new(name.trim(), value.trim()))
            }
            _ => Err(KafkaError::InvalidRequest(format!(
                "parameter must be NAME=VALUE, got '{}'",
                raw
            ))),
        }
    }
}

/// Response of `PUT .../configs`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModifyConfigResponse {
    #[serde(default)]
    pub job_id: String,

    #[serde(default)]
    pub dynamic_config: i64,

    #[serde(default)]
    pub static_config: i64,
}

/// Outcome of a parameter modification
///
/// Static parameters only take effect after a restart; the caller decides
/// whether to issue one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterUpdate {
    pub job_id: String,
    pub requires_restart: bool,
}

impl From<ModifyConfigResponse> for ParameterUpdate {
    fn from(resp: ModifyConfigResponse) -> Self {
        Self {
            job_id: resp.job_id,
            requires_restart: resp.static_config > 0,
        }
    }
}

/// Response carrying the ID of the job a mutation started
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobAccepted {
    #[serde(default)]
    pub job_id: String,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// User/client throughput quota
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientQuota {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(rename = "user-default", default, skip_serializing_if = "is_false")]
    pub user_default: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,

    #[serde(rename = "client-default", default, skip_serializing_if = "is_false")]
    pub client_default: bool,

    #[serde(
        rename = "producer-byte-rate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub producer_byte_rate: Option<u64>,

    #[serde(
        rename = "consumer-byte-rate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub consumer_byte_rate: Option<u64>,
}

impl ClientQuota {
    /// A quota must name a user, a client, or one of their defaults
    pub fn validate(&self) -> Result<()> {
        let named = self.user.as_deref().is_some_and(|u| !u.is_empty())
            || self.client.as_deref().is_some_and(|c| !c.is_empty());
        if named || self.user_default || self.client_default {
            Ok(())
        } else {
            Err(KafkaError::InvalidRequest(
                "quota needs at least one of user, user-default, client, client-default"
                    .to_string(),
            ))
        }
    }

    /// `instance/user/user-default/client/client-default`
    pub fn id(&self, instance_id: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            instance_id,
            self.user.as_deref().unwrap_or_default(),
            self.user_default,
            self.client.as_deref().unwrap_or_default(),
            self.client_default
        )
    }
}

/// Listener protocols toggled by `plain-ssl-switch`
pub const PORT_PROTOCOLS: &[&str] = &[
    "private_plain_enable",
    "private_sasl_ssl_enable",
    "private_sasl_plaintext_enable",
    "public_plain_enable",
    "public_sasl_ssl_enable",
    "public_sasl_plaintext_enable",
];

/// Request of `POST .../plain-ssl-switch`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortProtocolSwitch {
    pub protocol: String,
    pub enable: bool,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub sasl_enabled_mechanisms: Vec<String>,
}

impl PortProtocolSwitch {
    pub fn new(protocol: impl Into<String>, enable: bool) -> Self {
        Self {
            protocol: protocol.into(),
            enable,
            ..Self::default()
        }
    }

    pub fn is_sasl(&self) -> bool {
        self.protocol.contains("_sasl_")
    }

    pub fn validate(&self) -> Result<()> {
        if PORT_PROTOCOLS.contains(&self.protocol.as_str()) {
            Ok(())
        } else {
            Err(KafkaError::InvalidRequest(format!(
                "unknown port protocol '{}', expected one of {:?}",
                self.protocol, PORT_PROTOCOLS
            )))
        }
    }

    /// SASL mechanisms are only sent for SASL listeners
    pub fn body(&self) -> Value {
        let mut body = json!({
            "protocol": self.protocol,
            "enable": self.enable,
        });
        if let Some(user) = self.user_name.as_deref().filter(|u| !u.is_empty()) {
            body["user_name"] = json!(user);
        }
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            body["pass_word"] = json!(password);
        }
        if self.is_sasl() && !self.sasl_enabled_mechanisms.is_empty() {
            body["sasl_enabled_mechanisms"] = json!(self.sasl_enabled_mechanisms);
        }
        body
    }
}

/// Mutable instance attributes of `PUT .../instances/{instance_id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintain_begin: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintain_end: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_group_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_policy: Option<String>,
}

impl InstanceUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CROSS_VPC: &str = r#"{
        "192.168.0.62": {"advertised_ip": "192.168.0.62", "port": 9011, "port_id": "p-1"},
        "192.168.0.17": {"advertised_ip": "192.168.0.17", "port": 9011, "port_id": "p-2"},
        "192.168.0.8":  {"advertised_ip": "192.168.0.8",  "port": 9011, "port_id": "p-3"}
    }"#;

    fn instance(broker_num: u32, cross_vpc_info: &str) -> InstanceInfo {
        InstanceInfo {
            instance_id: "inst-1".to_string(),
            status: "RUNNING".to_string(),
            broker_num,
            cross_vpc_info: cross_vpc_info.to_string(),
            ..InstanceInfo::default()
        }
    }

    #[test]
    fn test_bindings_empty_until_bound() {
        let set = instance(3, "").bindings().unwrap();
        assert!(set.is_empty());
        assert!(!set.is_complete(3));
    }

    #[test]
    fn test_bindings_complete_only_on_exact_count() {
        let set = instance(3, CROSS_VPC).bindings().unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.is_complete(3));
        assert!(!set.is_complete(4));

        // broker count already moved on, bindings have not caught up
        let lagging = instance(5, CROSS_VPC).bindings().unwrap();
        assert!(!lagging.is_complete(5));
    }

    #[test]
    fn test_bindings_parse_error() {
        let err = instance(3, "{not json").bindings().unwrap_err();
        assert!(matches!(err, KafkaError::CrossVpcInfo { .. }));
    }

    #[test]
    fn test_rebind_matches_sorted_listeners() {
        let set = instance(3, CROSS_VPC).bindings().unwrap();
        let contents = set.rebind(&["10.0.0.1".to_string(), String::new()]);

        // string order: .17 < .62 < .8
        assert_eq!(contents["192.168.0.17"], "10.0.0.1");
        assert_eq!(contents["192.168.0.62"], "192.168.0.62");
        assert_eq!(contents["192.168.0.8"], "192.168.0.8");
    }

    #[test]
    fn test_resize_bodies() {
        let flavor = ResizeRequest::Flavor {
            product_id: "c6.4u8g.cluster".to_string(),
        };
        assert_eq!(flavor.body()["oper_type"], "vertical");
        assert_eq!(flavor.body()["new_product_id"], "c6.4u8g.cluster");

        let storage = ResizeRequest::Storage { storage_space: 600 };
        assert_eq!(storage.body()["new_storage_space"], 600);

        let brokers = ResizeRequest::Brokers {
            broker_num: 5,
            public_ip_ids: vec!["eip-1".to_string(), "eip-2".to_string()],
            tenant_ips: Vec::new(),
        };
        let body = brokers.body();
        assert_eq!(body["oper_type"], "horizontal");
        assert_eq!(body["new_broker_num"], 5);
        assert_eq!(body["publicip_id"], "eip-1,eip-2");
        assert!(body.get("tenant_ips").is_none());
    }

    #[test]
    fn test_resize_is_reflected() {
        let mut info = instance(3, "");
        info.total_storage_space = 300;
        info.product_id = "c6.2u4g.cluster".to_string();

        assert!(!ResizeRequest::brokers(5).is_reflected(&info));
        assert!(ResizeRequest::brokers(3).is_reflected(&info));
        assert!(!ResizeRequest::Storage { storage_space: 600 }.is_reflected(&info));
        assert!(
            ResizeRequest::Flavor {
                product_id: "c6.2u4g.cluster".to_string()
            }
            .is_reflected(&info)
        );
    }

    #[test]
    fn test_resize_validate_against_current() {
        let mut current = instance(3, "");
        current.total_storage_space = 300;

        assert!(ResizeRequest::brokers(5).validate_against(&current).is_ok());
        assert!(ResizeRequest::brokers(3).validate_against(&current).is_err());
        assert!(
            ResizeRequest::Storage { storage_space: 200 }
                .validate_against(&current)
                .is_err()
        );

        let eips = ResizeRequest::Brokers {
            broker_num: 5,
            public_ip_ids: vec!["eip-1".to_string()],
            tenant_ips: Vec::new(),
        };
        assert!(matches!(
            eips.validate_against(&current),
            Err(KafkaError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_cross_vpc_failed_listeners() {
        let result: CrossVpcUpdateResult = serde_json::from_str(
            r#"{"success": false, "results": [
                {"listeners_ip": "192.168.0.8", "advertised_ip": "10.0.0.8", "success": true},
                {"listeners_ip": "192.168.0.9", "advertised_ip": "10.0.0.9", "success": false}
            ]}"#,
        )
        .unwrap();
        assert_eq!(result.failed_listeners(), vec!["192.168.0.9".to_string()]);
    }

    #[test]
    fn test_parameter_update_restart_flag() {
        let resp: ModifyConfigResponse =
            serde_json::from_str(r#"{"job_id":"job-1","dynamic_config":1,"static_config":2}"#)
                .unwrap();
        let update = ParameterUpdate::from(resp);
        assert_eq!(update.job_id, "job-1");
        assert!(update.requires_restart);

        let resp: ModifyConfigResponse =
            serde_json::from_str(r#"{"job_id":"job-2","dynamic_config":1,"static_config":0}"#)
                .unwrap();
        assert!(!ParameterUpdate::from(resp).requires_restart);
    }

    #[test]
    fn test_config_param_parse() {
        let param = ConfigParam::parse("log.retention.hours = 72").unwrap();
        assert_eq!(param, ConfigParam::new("log.retention.hours", "72"));
        assert!(ConfigParam::parse("no-equals-sign").is_err());
        assert!(ConfigParam::parse("=value").is_err());
    }

    #[test]
    fn test_client_quota_wire_names() {
        let quota = ClientQuota {
            user: Some("alice".to_string()),
            client_default: true,
            producer_byte_rate: Some(1024),
            ..ClientQuota::default()
        };
        let body = serde_json::to_value(&quota).unwrap();
        assert_eq!(body["user"], "alice");
        assert_eq!(body["client-default"], true);
        assert_eq!(body["producer-byte-rate"], 1024);
        assert!(body.get("user-default").is_none());
        assert!(body.get("consumer-byte-rate").is_none());
        assert_eq!(quota.id("inst-1"), "inst-1/alice/false//true");
    }

    #[test]
    fn test_client_quota_validate() {
        assert!(ClientQuota::default().validate().is_err());
        let quota = ClientQuota {
            user_default: true,
            ..ClientQuota::default()
        };
        assert!(quota.validate().is_ok());
    }

    #[test]
    fn test_port_protocol_body() {
        let mut switch = PortProtocolSwitch::new("public_sasl_ssl_enable", true);
        switch.user_name = Some("admin".to_string());
        switch.sasl_enabled_mechanisms = vec!["SCRAM-SHA-512".to_string()];
        let body = switch.body();
        assert_eq!(body["sasl_enabled_mechanisms"][0], "SCRAM-SHA-512");
        assert!(body.get("pass_word").is_none());

        let mut plain = PortProtocolSwitch::new("private_plain_enable", false);
        plain.sasl_enabled_mechanisms = vec!["PLAIN".to_string()];
        assert!(plain.body().get("sasl_enabled_mechanisms").is_none());

        assert!(PortProtocolSwitch::new("tls_everywhere", true).validate().is_err());
    }
}
