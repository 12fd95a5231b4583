//! Triage server binary

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use triage_server::{config::ServerConfig, start_server};

/// Document triage HTTP service
#[derive(Debug, Parser)]
#[command(name = "triage-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "TRIAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Print the resolved configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::load(cli.config.as_deref())?;

    if cli.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    start_server(config).await?;
    Ok(())
}
