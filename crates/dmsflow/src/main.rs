mod commands;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use dmsflow_kafka::KafkaError;
use dmsflow_reconcile::ErrorKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dms")]
#[command(
    about = "Run DMS Kafka operations and wait until the control plane has settled",
    long_about = None
)]
struct Cli {
    /// Settings file (defaults to DMSFLOW_CONFIG_PATH, ./dmsflow.local.yaml, ./dmsflow.yaml, ~/.config/dmsflow/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Instance lifecycle
    #[command(subcommand)]
    Instance(InstanceCommands),
    /// Broker parameters
    #[command(subcommand)]
    Params(ParamsCommands),
    /// User/client quotas
    #[command(subcommand)]
    Quota(QuotaCommands),
    /// Smart-connect tasks
    #[command(subcommand)]
    Connector(ConnectorCommands),
    /// Background jobs
    #[command(subcommand)]
    Task(TaskCommands),
    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum InstanceCommands {
    /// Wait for a new instance to finish creating, then apply follow-up settings
    Wait {
        instance_id: String,
        /// Advertised address per listener, in listener IP order
        #[arg(long = "advertised-ip", value_name = "IP")]
        advertised_ips: Vec<String>,
        /// Initial parameter (NAME=VALUE); restarts when a static one changes
        #[arg(long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,
    },
    /// Change flavor, storage or broker count
    Resize {
        instance_id: String,
        /// New flavor (product ID)
        #[arg(long, conflicts_with_all = ["storage", "brokers"])]
        flavor: Option<String>,
        /// New total storage in GB
        #[arg(long, conflicts_with = "brokers")]
        storage: Option<u64>,
        /// New broker count
        #[arg(long)]
        brokers: Option<u32>,
        /// EIP ID for each added broker
        #[arg(long = "eip", value_name = "EIP_ID", requires = "brokers")]
        eips: Vec<String>,
        /// Private IP for added brokers
        #[arg(long = "tenant-ip", value_name = "IP", requires = "brokers")]
        tenant_ips: Vec<String>,
    },
    /// Restart all brokers
    Restart { instance_id: String },
    /// Delete an instance
    Delete { instance_id: String },
    /// Point listeners at new advertised addresses
    Bind {
        instance_id: String,
        #[arg(long = "advertised-ip", value_name = "IP", required = true)]
        advertised_ips: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ParamsCommands {
    /// Modify broker parameters
    Set {
        instance_id: String,
        /// Parameters as NAME=VALUE
        #[arg(required = true, value_name = "NAME=VALUE")]
        params: Vec<String>,
        /// Restart when a static parameter changed
        #[arg(long)]
        restart: bool,
    },
}

#[derive(Args)]
struct QuotaArgs {
    instance_id: String,
    #[arg(long)]
    user: Option<String>,
    #[arg(long)]
    user_default: bool,
    #[arg(long)]
    client: Option<String>,
    #[arg(long)]
    client_default: bool,
    /// Producer rate limit in bytes/s
    #[arg(long)]
    producer_byte_rate: Option<u64>,
    /// Consumer rate limit in bytes/s
    #[arg(long)]
    consumer_byte_rate: Option<u64>,
}

#[derive(Subcommand)]
enum QuotaCommands {
    /// Create a quota
    Create(QuotaArgs),
    /// Update a quota
    Update(QuotaArgs),
    /// Delete a quota
    Delete(QuotaArgs),
}

#[derive(Subcommand)]
enum ConnectorCommands {
    /// Create a task from a JSON request file
    Create {
        instance_id: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete a task
    Delete { instance_id: String, task_id: String },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Wait for a job to finish
    Wait { instance_id: String, job_id: String },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli).await;
    if let Err(err) = &result {
        if let Some(kind) = err.downcast_ref::<KafkaError>().and_then(KafkaError::kind) {
            eprintln!("Error: {:#}", err);
            eprintln!();
            eprintln!("{}", format!("✗ Operation ended: {}", kind).red().bold());
            std::process::exit(exit_code(kind));
        }
    }
    result
}

/// Process exit code per failure kind; other errors exit with 1
fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Fatal => 2,
        ErrorKind::TaskFailed => 3,
        ErrorKind::UnexpectedState => 4,
        ErrorKind::Query => 5,
        ErrorKind::Timeout => 6,
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Version does not need settings
    if matches!(cli.command, Commands::Version) {
        println!("dmsflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let service = commands::connect(cli.config.as_deref())?;

    match cli.command {
        Commands::Instance(cmd) => match cmd {
            InstanceCommands::Wait {
                instance_id,
                advertised_ips,
                params,
            } => commands::instance::wait(&service, &instance_id, &advertised_ips, &params).await,
            InstanceCommands::Resize {
                instance_id,
                flavor,
                storage,
                brokers,
                eips,
                tenant_ips,
            } => {
                let request =
                    commands::instance::resize_request(flavor, storage, brokers, eips, tenant_ips)?;
                commands::instance::resize(&service, &instance_id, &request).await
            }
            InstanceCommands::Restart { instance_id } => {
                commands::instance::restart(&service, &instance_id).await
            }
            InstanceCommands::Delete { instance_id } => {
                commands::instance::delete(&service, &instance_id).await
            }
            InstanceCommands::Bind {
                instance_id,
                advertised_ips,
            } => commands::instance::bind(&service, &instance_id, &advertised_ips).await,
        },
        Commands::Params(ParamsCommands::Set {
            instance_id,
            params,
            restart,
        }) => commands::params::set(&service, &instance_id, &params, restart).await,
        Commands::Quota(cmd) => {
            let (action, args) = match cmd {
                QuotaCommands::Create(args) => (commands::quota::Action::Create, args),
                QuotaCommands::Update(args) => (commands::quota::Action::Update, args),
                QuotaCommands::Delete(args) => (commands::quota::Action::Delete, args),
            };
            let quota = dmsflow_kafka::ClientQuota {
                user: args.user,
                user_default: args.user_default,
                client: args.client,
                client_default: args.client_default,
                producer_byte_rate: args.producer_byte_rate,
                consumer_byte_rate: args.consumer_byte_rate,
            };
            commands::quota::handle(&service, action, &args.instance_id, &quota).await
        }
        Commands::Connector(cmd) => match cmd {
            ConnectorCommands::Create { instance_id, file } => {
                commands::connector::create(&service, &instance_id, &file).await
            }
            ConnectorCommands::Delete {
                instance_id,
                task_id,
            } => commands::connector::delete(&service, &instance_id, &task_id).await,
        },
        Commands::Task(TaskCommands::Wait {
            instance_id,
            job_id,
        }) => commands::task::wait(&service, &instance_id, &job_id).await,
        Commands::Version => Ok(()),
    }
}
