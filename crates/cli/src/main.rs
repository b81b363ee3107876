//! Car Price Predictor CLI
//!
//! A command-line tool for requesting price predictions from the service,
//! inspecting the loaded model, and evaluating artifacts offline.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{evaluate, predict, service};
use std::path::PathBuf;

/// Car Price Predictor CLI
#[derive(Parser)]
#[command(name = "carprice")]
#[command(author, version, about = "CLI for the Car Price Predictor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via CARPRICE_API_URL env var)
    #[arg(long, env = "CARPRICE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the price of a vehicle
    Predict(predict::VehicleArgs),

    /// List accepted input fields and their valid values
    Features,

    /// Show the loaded model
    Model,

    /// Check service health
    Health,

    /// Evaluate a model artifact locally against a labelled dataset
    Evaluate {
        /// Model artifact (.json forest or .onnx)
        #[arg(long)]
        model: PathBuf,

        /// JSON array of records with a Selling_Price label
        #[arg(long)]
        data: PathBuf,

        /// Expected SHA-256 of the artifact
        #[arg(long)]
        sha256: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::Config::load()?;
    let format = config.resolve_format(cli.format)?;

    // Execute command
    match cli.command {
        Commands::Evaluate { model, data, sha256 } => {
            evaluate::evaluate(&model, &data, sha256.as_deref(), format)?;
        }
        Commands::Predict(vehicle) => {
            let client = api_client(&config, cli.api_url.as_deref())?;
            predict::predict(&client, &vehicle, format).await?;
        }
        Commands::Features => {
            let client = api_client(&config, cli.api_url.as_deref())?;
            service::show_features(&client, format).await?;
        }
        Commands::Model => {
            let client = api_client(&config, cli.api_url.as_deref())?;
            service::show_model(&client, format).await?;
        }
        Commands::Health => {
            let client = api_client(&config, cli.api_url.as_deref())?;
            service::show_health(&client, format).await?;
        }
    }

    Ok(())
}

fn api_client(config: &config::Config, flag: Option<&str>) -> Result<client::ApiClient> {
    client::ApiClient::new(&config.resolve_api_url(flag))
}
