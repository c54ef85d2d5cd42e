//! # prooff CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use prooff_anchor::AnchorConfig;
use tracing_subscriber::EnvFilter;

use prooff_cli::anchor::{run_anchor, AnchorArgs};
use prooff_cli::hash::{run_hash, HashArgs};
use prooff_cli::probe::{run_probe, ProbeArgs};
use prooff_cli::verify::{run_verify, VerifyArgs};
use prooff_cli::ChainArgs;

/// Prooff CLI
///
/// Hash creative works, probe the anchoring chains, and create or verify
/// proof-of-existence anchors without running the API.
#[derive(Parser, Debug)]
#[command(name = "prooff", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    chain: ChainArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the SHA-256 content hash of a file.
    Hash(HashArgs),

    /// Read a block header from a chain.
    Probe(ProbeArgs),

    /// Anchor a content hash through the fallback chain.
    Anchor(AnchorArgs),

    /// Verify an anchor record file.
    Verify(VerifyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Stdout carries the JSON results.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(dispatch(cli)),
        Err(e) => Err(anyhow::Error::new(e).context("failed to start async runtime")),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<u8> {
    match &cli.command {
        Commands::Hash(args) => run_hash(args),
        Commands::Probe(args) => run_probe(args, &chain_config(&cli.chain)?).await,
        Commands::Anchor(args) => run_anchor(args, &chain_config(&cli.chain)?).await,
        Commands::Verify(args) => run_verify(args, &chain_config(&cli.chain)?).await,
    }
}

fn chain_config(chain: &ChainArgs) -> anyhow::Result<AnchorConfig> {
    let config = chain.anchor_config()?;
    tracing::debug!(
        fallback_order = ?config.fallback_order,
        stage_timeout_secs = config.stage_timeout_secs,
        "chain configuration loaded"
    );
    Ok(config)
}
