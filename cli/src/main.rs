//! dumblyd: treasury distribution daemon

use clap::Parser;
use dumbly_api::ApiState;
use dumbly_cli::{seed_dev_ledger, FileConfig};
use dumbly_core::LedgerGateway;
use dumbly_ledger::NodeClient;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use treasury::{SettlementConfig, SettlementExecutor};

/// Treasury balances seeded by `--dev`: three taxed sells
const DEV_SELLS: [u64; 3] = [10_000_000, 25_000_000, 4_200_000];

#[derive(Parser)]
#[command(name = "dumblyd")]
#[command(about = "Dumbly treasury distribution daemon", version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run against a seeded in-memory ledger instead of a node
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!(
        "{} {}",
        "dumblyd".cyan().bold(),
        format!("v{} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH")).bright_black()
    );

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    }
    .with_env()?;

    let (executor, api) = if cli.dev {
        let api = file.api_settings()?;
        let dev = seed_dev_ledger(&DEV_SELLS).await?;
        let mut config = SettlementConfig::new(dev.asset_id, dev.targets);
        config.confirmation_rounds = file.confirmation_rounds();

        println!("{}", "Running against seeded in-memory ledger".yellow());
        println!("  Asset:    {}", dev.asset_id);
        println!("  Program:  {}", dev.program_id);
        println!("  Treasury: {}", dev.treasury.address().bright_blue());

        let gateway: Arc<dyn LedgerGateway> = dev.ledger;
        (SettlementExecutor::new(gateway, dev.treasury, config)?, api)
    } else {
        let config = file.resolve()?;
        tracing::info!(node = %config.node.client.address, asset_id = config.asset_id, "connecting to ledger node");

        let gateway: Arc<dyn LedgerGateway> = Arc::new(NodeClient::new(config.node.client)?);
        let mut settlement = SettlementConfig::new(config.asset_id, config.targets);
        settlement.confirmation_rounds = config.node.confirmation_rounds;
        (
            SettlementExecutor::new(gateway, config.treasury_key, settlement)?,
            config.api,
        )
    };

    tracing::info!(treasury = %executor.treasury_address(), "settlement executor ready");
    println!("  API:      http://{}", api.listen.to_string().green());

    let state = ApiState::new(Arc::new(executor), cli.dev);
    dumbly_api::start_server(api.listen, &api.allowed_origin, state).await
}
