use super::{Service, done, started};

pub async fn wait(service: &Service, instance_id: &str, job_id: &str) -> anyhow::Result<()> {
    started(&format!("Waiting for job '{}'...", job_id));
    let task = service.wait_job(instance_id, job_id).await?;
    done(&format!("Job '{}' finished with {}", task.id, task.status));
    Ok(())
}
