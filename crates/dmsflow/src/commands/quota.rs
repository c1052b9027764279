use super::{Service, done, started};
use dmsflow_kafka::ClientQuota;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

pub async fn handle(
    service: &Service,
    action: Action,
    instance_id: &str,
    quota: &ClientQuota,
) -> anyhow::Result<()> {
    let id = quota.id(instance_id);
    let job = match action {
        Action::Create => {
            started(&format!("Creating quota {}...", id));
            service.create_quota(instance_id, quota).await?
        }
        Action::Update => {
            started(&format!("Updating quota {}...", id));
            service.update_quota(instance_id, quota).await?
        }
        Action::Delete => {
            started(&format!("Deleting quota {}...", id));
            service.delete_quota(instance_id, quota).await?
        }
    };

    done(&format!("Quota {} applied (job {})", id, job.id));
    Ok(())
}
