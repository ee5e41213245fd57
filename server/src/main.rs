// server/src/main.rs

// Entry point for the triage CLI: loads `.env`, sets up logging and hands
// over to the command dispatcher.

use anyhow::Result;
use triage_server::cli::start_cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    start_cli().await
}
