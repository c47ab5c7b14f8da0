//! Paper-trading simulator for copied trade signals.
//!
//! Runs several strategy variants side by side against isolated capital
//! pools, settles positions as markets resolve, and ranks the strategies
//! when the simulation ends.

mod engine;
mod error;
mod metrics;
mod models;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::engine::{CreateSimulation, SimulationEngine};
use crate::models::TradeSignal;
use crate::store::SqliteStore;

/// Multi-strategy paper-trading simulation CLI.
#[derive(Parser)]
#[command(name = "polysim")]
#[command(about = "Simulate copy-trading strategies against live signals", long_about = None)]
struct Cli {
    /// Database file path
    #[arg(
        short,
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./polysim.db?mode=rwc"
    )]
    database: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a simulation from a JSON config file
    Create {
        /// Path to a create-simulation JSON payload
        config: PathBuf,
    },

    /// Feed one trade signal into a simulation
    Signal {
        /// Simulation id
        #[arg(short, long)]
        simulation: String,

        /// Path to a signal JSON payload; stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Deliver a market resolution
    Resolve {
        /// Simulation id
        #[arg(short, long)]
        simulation: String,

        /// Market condition id
        #[arg(short, long)]
        market: String,

        /// Winning outcome token, or VOID
        #[arg(short, long)]
        outcome: String,
    },

    /// Run one scheduler tick (cooldown release + hourly snapshots)
    Tick {
        /// Simulation id
        #[arg(short, long)]
        simulation: String,
    },

    /// Show capital and performance per strategy
    Status {
        /// Simulation id
        #[arg(short, long)]
        simulation: String,

        /// Include positions and snapshots
        #[arg(long)]
        full: bool,
    },

    /// End a simulation and print the final ranking
    End {
        /// Simulation id
        #[arg(short, long)]
        simulation: String,
    },

    /// List known simulations
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = SqliteStore::new(&cli.database)
        .await
        .context("Failed to open database")?;
    let engine = SimulationEngine::new(Arc::new(store));
    engine.restore().await.context("Failed to restore simulations")?;

    let now = Utc::now();

    match cli.command {
        Commands::Create { config } => {
            let raw = std::fs::read_to_string(&config)
                .with_context(|| format!("Failed to read {}", config.display()))?;
            let request: CreateSimulation =
                serde_json::from_str(&raw).context("Invalid simulation config")?;

            let sim = engine.create_simulation(request, now).await?;
            print_json(&sim)?;
        }

        Commands::Signal { simulation, file } => {
            let raw = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => std::io::read_to_string(std::io::stdin())
                    .context("Failed to read signal from stdin")?,
            };
            let signal: TradeSignal =
                serde_json::from_str(&raw).context("Invalid signal payload")?;

            let outcome = engine.ingest_signal(&simulation, &signal, now).await?;
            print_json(&outcome)?;
        }

        Commands::Resolve {
            simulation,
            market,
            outcome,
        } => {
            let result = engine
                .resolve_market(&simulation, &market, &outcome, now)
                .await?;
            print_json(&result)?;
        }

        Commands::Tick { simulation } => {
            let outcome = engine.tick(&simulation, now).await?;
            print_json(&outcome)?;
        }

        Commands::Status { simulation, full } => {
            let status = engine.status(&simulation, full).await?;
            print_json(&status)?;
        }

        Commands::End { simulation } => {
            let report = engine.end_simulation(&simulation, now).await?;
            print_json(&report)?;
        }

        Commands::List => {
            let sims = engine.list().await;
            if sims.is_empty() {
                println!("No simulations. Use 'polysim create <config.json>' to start one.");
                return Ok(());
            }

            println!(
                "\n{:<38} {:<10} {:<22} {:>9} {:>9}",
                "ID", "STATE", "STARTED", "DURATION", "COOLDOWN"
            );
            println!("{}", "-".repeat(92));
            for sim in sims {
                println!(
                    "{:<38} {:<10} {:<22} {:>8}d {:>8}h",
                    sim.id,
                    sim.state.as_str(),
                    sim.starts_at.format("%Y-%m-%d %H:%M UTC"),
                    sim.settings.duration_days,
                    sim.settings.cooldown_hours
                );
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
