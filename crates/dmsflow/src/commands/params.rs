use super::{Service, done, started};
use colored::Colorize;
use dmsflow_kafka::ConfigParam;

/// Parse NAME=VALUE arguments
pub fn parse(raw: &[String]) -> anyhow::Result<Vec<ConfigParam>> {
    raw.iter()
        .map(|p| ConfigParam::parse(p).map_err(Into::into))
        .collect()
}

pub async fn set(
    service: &Service,
    instance_id: &str,
    raw: &[String],
    restart: bool,
) -> anyhow::Result<()> {
    let params = parse(raw)?;
    started(&format!(
        "Modifying {} parameter(s) of instance '{}'...",
        params.len(),
        instance_id
    ));
    for param in &params {
        println!("  • {} = {}", param.name.cyan(), param.value);
    }

    let update = if restart {
        service.initialize_parameters(instance_id, &params).await?
    } else {
        service.modify_parameters(instance_id, &params).await?
    };

    done(&format!("Parameters of '{}' updated", instance_id));
    if update.requires_restart && !restart {
        println!(
            "{}",
            "ℹ Static parameters changed; run `dms instance restart` to apply them".dimmed()
        );
    }
    Ok(())
}
