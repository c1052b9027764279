use super::{Service, done, started};
use colored::Colorize;
use dmsflow_kafka::ResizeRequest;

pub async fn wait(
    service: &Service,
    instance_id: &str,
    advertised_ips: &[String],
    params: &[String],
) -> anyhow::Result<()> {
    let params = super::params::parse(params)?;
    started(&format!("Waiting for instance '{}' to come up...", instance_id));

    let instance = service
        .wait_created(instance_id, advertised_ips, &params)
        .await?;

    done(&format!(
        "'{}' is {} with {} brokers",
        instance.name,
        instance.status,
        instance.broker_num
    ));
    Ok(())
}

/// Turn the mutually exclusive resize flags into a request
pub fn resize_request(
    flavor: Option<String>,
    storage: Option<u64>,
    brokers: Option<u32>,
    eips: Vec<String>,
    tenant_ips: Vec<String>,
) -> anyhow::Result<ResizeRequest> {
    match (flavor, storage, brokers) {
        (Some(product_id), None, None) => Ok(ResizeRequest::Flavor { product_id }),
        (None, Some(storage_space), None) => Ok(ResizeRequest::Storage { storage_space }),
        (None, None, Some(broker_num)) => Ok(ResizeRequest::Brokers {
            broker_num,
            public_ip_ids: eips,
            tenant_ips,
        }),
        _ => Err(anyhow::anyhow!(
            "Specify exactly one of --flavor, --storage or --brokers"
        )),
    }
}

pub async fn resize(
    service: &Service,
    instance_id: &str,
    request: &ResizeRequest,
) -> anyhow::Result<()> {
    started(&format!(
        "Resizing instance '{}' ({})...",
        instance_id,
        request.oper_type()
    ));

    let instance = service.resize(instance_id, request).await?;

    done(&format!(
        "'{}' resized: {} brokers, {} GB, flavor {}",
        instance.name,
        instance.broker_num,
        instance.total_storage_space,
        instance.product_id.cyan()
    ));
    Ok(())
}

pub async fn restart(service: &Service, instance_id: &str) -> anyhow::Result<()> {
    started(&format!("Restarting instance '{}'...", instance_id));
    service.restart(instance_id).await?;
    done(&format!("'{}' restarted", instance_id));
    Ok(())
}

pub async fn delete(service: &Service, instance_id: &str) -> anyhow::Result<()> {
    started(&format!("Deleting instance '{}'...", instance_id));
    service.delete(instance_id).await?;
    done(&format!("'{}' deleted", instance_id));
    Ok(())
}

pub async fn bind(
    service: &Service,
    instance_id: &str,
    advertised_ips: &[String],
) -> anyhow::Result<()> {
    started(&format!(
        "Updating advertised IPs of instance '{}'...",
        instance_id
    ));
    service
        .update_advertised_ips(instance_id, advertised_ips)
        .await?;
    done(&format!("Advertised IPs of '{}' updated", instance_id));
    Ok(())
}
