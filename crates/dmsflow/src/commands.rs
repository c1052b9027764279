pub mod connector;
pub mod instance;
pub mod params;
pub mod quota;
pub mod task;

use colored::Colorize;
use dmsflow_kafka::{ClientConfig, DmsClient, KafkaService, Timeouts, timing};
use std::path::Path;

pub type Service = KafkaService<DmsClient>;

/// Build the service from the settings file and the token environment variable
pub fn connect(config: Option<&Path>) -> anyhow::Result<Service> {
    let settings = match config {
        Some(path) => dmsflow_config::load_from(path)?,
        None => dmsflow_config::load()?,
    };
    tracing::debug!(
        "Using endpoint {} (project {})",
        settings.endpoint,
        settings.project_id
    );

    let client = DmsClient::new(ClientConfig::from_settings(&settings)?)?;
    Ok(KafkaService::new(client)
        .with_config(timing::reconcile_config(&settings))
        .with_timeouts(Timeouts::from(&settings.timeouts)))
}

pub fn started(message: &str) {
    println!("{}", message.yellow());
}

pub fn done(message: &str) {
    println!();
    println!("{}", format!("✓ {}", message).green().bold());
}
