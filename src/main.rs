//! Main entry point for the paged-rpc CLI

use clap::Parser;
use paged_rpc::cli::{self, Cli};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("paged_rpc=info"));

    // Logs go to stderr so stdout carries only command output
    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = cli::run(&cli).await.and_then(|value| cli.render(&value));

    match result {
        Ok(text) => println!("{text}"),
        Err(e) => {
            error!("Command failed: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
