//! # prooff-cli: Command-Line Tool for the Prooff Stack
//!
//! ## Subcommands
//!
//! - `prooff hash <file>`: SHA-256 content hash of a work.
//! - `prooff probe <network> [--block N]`: read one block header.
//! - `prooff anchor --content-hash H --certificate-id C [--out file]`:
//!   anchor through the fallback chain without the API.
//! - `prooff verify <record.json>`: verify an anchor record.
//!
//! Chain endpoints come from the same `PROOFF_*` environment variables as
//! the API, overridable with `--rpc-url network=url`.

pub mod anchor;
pub mod hash;
pub mod probe;
pub mod verify;

use anyhow::{Context, Result};
use clap::Args;
use prooff_anchor::{AnchorConfig, Network};

/// Chain options shared by every network-facing subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ChainArgs {
    /// Override a chain endpoint, e.g. `--rpc-url polygon=https://rpc.example`.
    #[arg(long = "rpc-url", value_name = "NETWORK=URL", value_parser = parse_rpc_override, global = true)]
    pub rpc_urls: Vec<(Network, String)>,

    /// Fail-fast timeout per fallback stage, in seconds.
    #[arg(long, value_name = "SECS", global = true)]
    pub stage_timeout: Option<u64>,
}

impl ChainArgs {
    /// Environment configuration with command-line overrides applied.
    pub fn anchor_config(&self) -> Result<AnchorConfig> {
        let base = AnchorConfig::from_env().context("invalid PROOFF_* configuration")?;
        self.apply(base)
    }

    pub fn apply(&self, mut config: AnchorConfig) -> Result<AnchorConfig> {
        for (network, url) in &self.rpc_urls {
            config = config
                .with_rpc_url(*network, url)
                .with_context(|| format!("invalid --rpc-url for {network}"))?;
        }
        if let Some(secs) = self.stage_timeout {
            let rpc = config.rpc_timeout_secs;
            config = config.with_timeouts(rpc, secs);
        }
        Ok(config)
    }
}

/// Parse `network=url`.
pub fn parse_rpc_override(raw: &str) -> Result<(Network, String), String> {
    let (network, url) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NETWORK=URL, got {raw:?}"))?;
    let network: Network = network.trim().parse().map_err(|e| format!("{e}"))?;
    if !network.is_chain() {
        return Err(format!("{network} has no RPC endpoint"));
    }
    Ok((network, url.trim().to_string()))
}
