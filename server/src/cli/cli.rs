// server/src/cli/cli.rs

// Parses the command line, loads configuration and dispatches.

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use serde_json::json;

use lib::TriageConfig;

use super::commands::{CliArgs, Commands};
use super::handlers::{handle_hash_key, handle_import, handle_predict, handle_serve, handle_status, handle_train};

pub async fn start_cli() -> Result<()> {
    let args = CliArgs::parse();
    run_command(args).await
}

pub async fn run_command(args: CliArgs) -> Result<()> {
    if let Commands::HashKey { key } = &args.command {
        println!("{}", handle_hash_key(key)?);
        return Ok(());
    }

    let config = TriageConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    debug!("Loaded configuration: {:?}", config.redacted());

    match args.command {
        Commands::Train { input, from_store, limit, output } => {
            let report = handle_train(&config, input, from_store, limit, output).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Serve { port } => handle_serve(&config, port).await?,
        Commands::Predict { input, apply_update } => {
            let output = handle_predict(&config, &input, apply_update).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Status { port } => {
            let health = handle_status(&config, port).await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        Commands::Import { input, tree, id_field } => {
            let written = handle_import(&config, &input, tree, &id_field).await?;
            println!("{}", json!({ "imported": written }));
        }
        Commands::HashKey { .. } => {}
    }
    Ok(())
}
