//! relay CLI - tool invocation orchestrator.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

mod commands;
mod input;
mod output;
pub(crate) mod shared;
mod toolkit;

/// relay - run text tools that call each other under chain limits.
#[derive(Debug, Parser)]
#[command(name = "relay", version, about)]
struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv). Overrides `logging.level`.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format: plain (default) or json (for log aggregation).
    #[arg(long, global = true, default_value = "plain", value_parser = ["plain", "json"])]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the registered tools.
    Tools(commands::tools::ToolsArgs),
    /// Invoke one tool in a fresh chain.
    Invoke(commands::invoke::InvokeArgs),
    /// Invoke several tools concurrently in one chain.
    Batch(commands::batch::BatchArgs),
    /// Invoke tools one after another, threading outputs.
    Sequence(commands::sequence::SequenceArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = relay_config::load_config(cli.config.as_deref())?;

    let filter = match cli.verbose {
        0 => EnvFilter::new(&config.logging.level),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    match cli.log_format.as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    };

    tracing::debug!(config_path = ?cli.config, "relay starting");
    let orchestrator = shared::build_orchestrator(&config)?;

    match &cli.command {
        Commands::Tools(args) => commands::tools::execute(args, &orchestrator),
        Commands::Invoke(args) => commands::invoke::execute(args, &orchestrator).await,
        Commands::Batch(args) => commands::batch::execute(args, &orchestrator).await,
        Commands::Sequence(args) => commands::sequence::execute(args, &orchestrator).await,
    }
}
