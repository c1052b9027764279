//! Poll timing and deadlines of each DMS Kafka use case

use dmsflow_config::{Settings, TimeoutSettings};
use dmsflow_reconcile::{PollTiming, ReconcileConfig, StateTarget};
use std::time::Duration;

/// Stability wait between conflicting submissions
pub const STABILIZE: PollTiming = PollTiming::from_secs(1, 10);
/// Stability wait for heavier mutations (configs, restart, rebind, port protocol)
pub const STABILIZE_SLOW: PollTiming = PollTiming::from_secs(10, 10);

pub const CREATE_STATE: PollTiming = PollTiming::from_secs(15, 15);
pub const RESIZE_STATE: PollTiming = PollTiming::from_secs(180, 15);
pub const RESTART_STATE: PollTiming = PollTiming::from_secs(5, 5);
pub const DELETE_STATE: PollTiming = PollTiming::from_secs(120, 15);
pub const BINDINGS: PollTiming = PollTiming::from_secs(10, 10);

pub const JOB: PollTiming = PollTiming::from_secs(1, 5);
pub const PARAMETER_JOB: PollTiming = PollTiming::from_secs(2, 2);
pub const PORT_PROTOCOL_JOB: PollTiming = PollTiming::from_secs(15, 15);
pub const CONNECTOR_TASK: PollTiming = PollTiming::from_secs(1, 5);

/// Statuses an instance passes through on its way back to RUNNING
pub const TRANSITIONAL: &[&str] = &[
    "CREATING",
    "RESTARTING",
    "EXTENDING",
    "SHRINKING",
    "CHANGING",
    "UPGRADING",
    "ROLLBACK",
    "CONNECTOR_CREATING",
    "CONNECTOR_DELETING",
];

pub const RUNNING: &str = "RUNNING";

/// Wait for an instance to accept mutations again
pub fn stable() -> StateTarget {
    StateTarget::new(TRANSITIONAL.iter().copied(), [RUNNING])
}

/// Per-operation deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
    pub connector: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(50 * 60),
            update: Duration::from_secs(50 * 60),
            delete: Duration::from_secs(15 * 60),
            connector: Duration::from_secs(30 * 60),
        }
    }
}

impl From<&TimeoutSettings> for Timeouts {
    fn from(settings: &TimeoutSettings) -> Self {
        Self {
            create: settings.create(),
            update: settings.update(),
            delete: settings.delete(),
            connector: settings.connector(),
        }
    }
}

/// Base reconcile settings with the stability timing used across use cases
pub fn base_config() -> ReconcileConfig {
    ReconcileConfig::default()
        .with_stabilize(STABILIZE)
        .with_state(CREATE_STATE)
        .with_task(JOB)
        .with_readiness(BINDINGS)
}

/// [`base_config`] with the overrides of a settings file
pub fn reconcile_config(settings: &Settings) -> ReconcileConfig {
    let config = base_config();
    match settings.not_found_checks {
        Some(checks) => config.with_not_found_checks(checks),
        None => config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_target() {
        let states = stable();
        assert!(states.is_target("RUNNING"));
        assert!(states.is_pending("EXTENDING"));
        assert!(!states.is_pending("ERROR"));
    }

    #[test]
    fn test_timeouts_from_settings() {
        let settings = TimeoutSettings {
            delete: 5,
            ..TimeoutSettings::default()
        };
        let timeouts = Timeouts::from(&settings);
        assert_eq!(timeouts.delete, Duration::from_secs(300));
        assert_eq!(timeouts.create, Timeouts::default().create);
    }

    #[test]
    fn test_reconcile_config_overrides_not_found_checks() {
        let mut settings = Settings {
            endpoint: "https://dms.example.com".to_string(),
            project_id: "p-1".to_string(),
            region: None,
            token_env: "DMS_AUTH_TOKEN".to_string(),
            timeouts: TimeoutSettings::default(),
            not_found_checks: None,
        };
        assert_eq!(reconcile_config(&settings).not_found_checks, 20);

        settings.not_found_checks = Some(3);
        let config = reconcile_config(&settings);
        assert_eq!(config.not_found_checks, 3);
        assert_eq!(config.stabilize, STABILIZE);
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.create, Duration::from_secs(3000));
        assert_eq!(timeouts.delete, Duration::from_secs(900));
        assert_eq!(timeouts.connector, Duration::from_secs(1800));
    }
}
