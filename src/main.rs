use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repoint::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "repoint",
    version,
    about = "Keeps DNS-named endpoints reachable by re-pointing blocked hosts to fresh static addresses",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, default_value = "repoint.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve metrics and reconcile on the configured schedule
    Run,

    /// Run a single reconciliation cycle
    Once,

    /// Print the managed inventory
    Inventory,

    /// Probe every managed record without repairing
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;

    // Initialize tracing/logging
    let format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&format, &config.logging.level, cli.verbose);

    tracing::info!(config = %cli.config.display(), "repoint starting");

    match cli.command {
        Commands::Run => commands::run(config).await?,
        Commands::Once => commands::once(config).await?,
        Commands::Inventory => commands::inventory(config).await?,
        Commands::Check => commands::check(config).await?,
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) {
    let default_directive = if verbose {
        "repoint=debug,info".to_string()
    } else {
        format!("repoint={level},warn")
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
