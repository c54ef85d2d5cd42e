//! # Probe Subcommand
//!
//! Reads one block header from a chain. Unlike anchoring, a failed probe is
//! an error: there is no fallback.

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use prooff_anchor::{AnchorConfig, BlockTag, Network, ProbeRegistry};
use serde::Serialize;

/// Arguments for `prooff probe`.
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Network to read (ethereum, polygon, arbitrum).
    pub network: Network,

    /// Block height. Defaults to the chain head.
    #[arg(long)]
    pub block: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub network: Network,
    pub block_number: u64,
    pub block_hash: String,
    pub block_timestamp_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

pub async fn run_probe(args: &ProbeArgs, config: &AnchorConfig) -> Result<u8> {
    let report = probe_network(args.network, args.block, config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}

pub async fn probe_network(
    network: Network,
    block: Option<u64>,
    config: &AnchorConfig,
) -> Result<ProbeReport> {
    if !network.is_chain() {
        bail!("{network} is not a chain and cannot be probed");
    }
    let registry = ProbeRegistry::from_config(config)?;
    let probe = registry
        .get(network)
        .with_context(|| format!("no RPC endpoint configured for {network}"))?;

    let tag = block.map_or(BlockTag::Latest, BlockTag::Number);
    tracing::info!(network = %network, block = %tag.to_param(), "probing");
    let header = tokio::time::timeout(config.stage_timeout(), probe.block(tag))
        .await
        .map_err(|_| anyhow!("{network}: timed out after {}s", config.stage_timeout_secs))??;

    Ok(ProbeReport {
        network,
        explorer_url: network.explorer_block_url(header.number),
        block_number: header.number,
        block_timestamp_ms: header.timestamp_ms(),
        block_hash: header.hash,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config_for(network: Network, url: &str) -> AnchorConfig {
        AnchorConfig::from_lookup(|_| None)
            .unwrap()
            .with_rpc_url(network, url)
            .unwrap()
            .with_timeouts(2, 2)
    }

    #[tokio::test]
    async fn reads_a_block_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {"number": "0x5", "hash": "0xab", "timestamp": "0x10"}
            })))
            .mount(&server)
            .await;

        let report = probe_network(Network::Arbitrum, Some(5), &config_for(Network::Arbitrum, &server.uri()))
            .await
            .unwrap();
        assert_eq!(report.block_number, 5);
        assert_eq!(report.block_timestamp_ms, 16_000);
        assert_eq!(report.explorer_url.as_deref(), Some("https://arbiscan.io/block/5"));
    }

    #[tokio::test]
    async fn unreachable_chain_is_an_error() {
        let config = config_for(Network::Polygon, "http://127.0.0.1:1");
        let err = probe_network(Network::Polygon, None, &config).await.unwrap_err();
        assert!(format!("{err:#}").contains("polygon"));
    }

    #[tokio::test]
    async fn local_cannot_be_probed() {
        let config = AnchorConfig::from_lookup(|_| None).unwrap();
        assert!(probe_network(Network::LocalVerifiable, None, &config).await.is_err());
    }
}
