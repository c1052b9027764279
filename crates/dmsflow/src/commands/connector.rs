use super::{Service, done, started};
use colored::Colorize;
use serde_json::Value;
use std::path::Path;

pub async fn create(service: &Service, instance_id: &str, file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;
    let definition: Value = serde_json::from_str(&raw)?;

    started(&format!(
        "Creating connector task on instance '{}'...",
        instance_id
    ));
    let (task_id, task) = service
        .create_connector_task(instance_id, &definition)
        .await?;

    done(&format!(
        "Connector task {} is {}",
        task_id.cyan(),
        task["status"].as_str().unwrap_or_default()
    ));
    Ok(())
}

pub async fn delete(service: &Service, instance_id: &str, task_id: &str) -> anyhow::Result<()> {
    started(&format!("Deleting connector task '{}'...", task_id));
    service.delete_connector_task(instance_id, task_id).await?;
    done(&format!("Connector task '{}' deleted", task_id));
    Ok(())
}
