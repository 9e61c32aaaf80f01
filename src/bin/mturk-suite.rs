//! mturk-suite: run the requester conformance suite against the sandbox or,
//! when asked explicitly, production.

use std::path::PathBuf;

use clap::Parser;
use mturk_rs::client::{Client, ClientConfig};
use mturk_rs::config::{Config, Endpoint};
use mturk_rs::fixture::DEFAULT_TEMPLATE;
use mturk_rs::suite::{Group, Suite, WORKER_ID};
use mturk_rs::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "mturk-suite", about = "Mechanical Turk requester conformance suite")]
struct Cli {
    /// Service to run against: sandbox or production
    #[arg(long)]
    endpoint: Endpoint,
    /// TOML config file; credentials come from the environment otherwise
    #[arg(long)]
    config: Option<PathBuf>,
    /// Question template used for every HIT
    #[arg(long, default_value = DEFAULT_TEMPLATE)]
    template: PathBuf,
    /// Only run these groups (repeatable)
    #[arg(long = "group")]
    groups: Vec<Group>,
    /// Worker targeted by block, notify and qualification scenarios
    #[arg(long, default_value = WORKER_ID)]
    worker_id: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref(), Some(cli.endpoint))?;
    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "mturk-suite".to_string(),
        default_filter: config.log_level.clone(),
    })?;

    if !config.endpoint.is_sandbox() {
        tracing::warn!("running against production: HITs created here cost money");
    }

    let client_config = config.client_config();
    let suite = suite(&client_config, &cli)?;
    println!(
        "Running {} group(s) against {}",
        suite.groups().len(),
        config.endpoint
    );

    let report = suite.run().await;

    println!();
    for scenario in report.scenarios() {
        println!("{scenario}");
    }
    println!(
        "\n{} passed, {} failed, {} skipped",
        report.passed(),
        report.failed(),
        report.skipped()
    );

    if !report.is_success() {
        anyhow::bail!("{} scenario(s) failed", report.failed());
    }
    Ok(())
}

fn suite(client_config: &ClientConfig, cli: &Cli) -> anyhow::Result<Suite> {
    let client = mturk_rs::create_client(client_config)?;
    #[allow(deprecated)]
    let legacy: Client = mturk_rs::connect(client_config)?;

    let suite = Suite::new(client, legacy)
        .with_template(&cli.template)
        .with_worker_id(&cli.worker_id)
        .with_sandbox_balance(client_config.endpoint().is_sandbox());
    Ok(if cli.groups.is_empty() {
        suite
    } else {
        suite.with_groups(&cli.groups)
    })
}
