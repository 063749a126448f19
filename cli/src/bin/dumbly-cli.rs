//! Dumbly admin CLI - treasury queries and distribution triggers

use clap::{Parser, Subcommand};
use dumbly_core::{format_units, TaxRate};
use owo_colors::OwoColorize;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "dumbly-cli")]
#[command(about = "Dumbly treasury admin tool", version)]
struct Cli {
    /// API endpoint
    #[arg(short, long, default_value = "http://127.0.0.1:8000")]
    api: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Current treasury balance
    Balance,

    /// Balances of the burn, lp and rewards accounts
    Targets,

    /// Distribute explicit amounts (base units)
    Distribute {
        #[arg(long, default_value_t = 0)]
        burn: u64,
        #[arg(long, default_value_t = 0)]
        lp: u64,
        #[arg(long, default_value_t = 0)]
        rewards: u64,
    },

    /// Split the whole treasury balance in thirds
    DistributeAll,

    /// Net and tax legs of a sell, computed locally
    TaxQuote {
        /// Gross sell amount in base units
        amount: u64,
        #[arg(long, default_value_t = 9)]
        rate: u8,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let api = cli.api.trim_end_matches('/');

    match cli.command {
        Commands::Balance => {
            let response = fetch(client.get(format!("{}/treasury-balance", api))).await?;
            let balance = response["treasury_balance"].as_u64().unwrap_or(0);

            println!("\n{}", "Treasury Balance".cyan().bold());
            println!("═══════════════════════════════════");
            println!("{} Dumbly ({} base units)", format_units(balance).green(), balance);
            println!();
        }

        Commands::Targets => {
            let response = fetch(client.get(format!("{}/targets-balance", api))).await?;

            println!("\n{}", "Distribution Targets".cyan().bold());
            println!("═══════════════════════════════════");
            for key in ["burn", "lp", "rewards"] {
                let amount = response[key].as_u64().unwrap_or(0);
                println!("{:<8} {}", key, format_units(amount).green());
            }
            println!();
        }

        Commands::Distribute { burn, lp, rewards } => {
            let response = fetch(
                client
                    .post(format!("{}/distribute-manual", api))
                    .json(&json!({ "burn": burn, "lp": lp, "rewards": rewards })),
            )
            .await?;
            print_distribution(&response);
        }

        Commands::DistributeAll => {
            let response = fetch(client.post(format!("{}/distribute-all", api))).await?;
            print_distribution(&response);
        }

        Commands::TaxQuote { amount, rate } => {
            let split = TaxRate::new(rate)?.split(amount);

            println!("\n{}", "Sell Tax Quote".cyan().bold());
            println!("═══════════════════════════════════");
            println!("Gross:    {}", format_units(amount));
            println!("Tax ({}%): {}", rate, format_units(split.tax).yellow());
            println!("Net:      {}", format_units(split.net).green());
            println!();
        }
    }

    Ok(())
}

/// Send and decode; API errors come back as `{"error","message"}`
async fn fetch(request: reqwest::RequestBuilder) -> Result<Value, Box<dyn std::error::Error>> {
    let response = request.send().await?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        let message = body["message"].as_str().unwrap_or("request failed");
        let mut text = format!("{} ({})", message, status);
        if let Some(txid) = body["txid"].as_str() {
            text.push_str(&format!("; check transaction {}", txid));
        }
        return Err(text.into());
    }
    Ok(body)
}

fn print_distribution(response: &Value) {
    println!("\n{}", "Distribution Submitted".green().bold());
    println!("═══════════════════════════════════");
    if let Some(txid) = response["txid"].as_str() {
        println!("Transaction: {}", txid.bright_blue());
    }
    if let Some(round) = response["confirmed_round"].as_u64() {
        println!("Confirmed:   round {}", round);
    }
    for key in ["burn", "lp", "rewards"] {
        let amount = response["distributed"][key].as_u64().unwrap_or(0);
        println!("  {:<8} {}", key, format_units(amount));
    }
    println!();
}
