//! # Network Probe
//!
//! Reads one block header from a chain over JSON-RPC
//! (`eth_getBlockByNumber`). Probes never write to a chain and never retry:
//! every failure is [`ProbeError::NetworkUnavailable`] and the caller decides
//! what happens next.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::config::AnchorConfig;
use crate::error::ProbeError;
use crate::network::Network;

/// Header fields of a chain block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block height.
    pub number: u64,
    /// `0x`-prefixed block hash, as returned by the node.
    pub hash: String,
    /// Block timestamp in seconds since the Unix epoch.
    pub timestamp_secs: u64,
}

impl BlockHeader {
    /// Block timestamp in milliseconds, saturating on overflow.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_secs.saturating_mul(1000)
    }
}

/// Which block to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    /// The chain head.
    Latest,
    /// A specific height.
    Number(u64),
}

impl BlockTag {
    /// JSON-RPC block parameter (`"latest"` or `"0x<hex>"`).
    pub fn to_param(&self) -> String {
        match self {
            Self::Latest => "latest".to_string(),
            Self::Number(n) => format!("0x{n:x}"),
        }
    }
}

/// Reads block headers from one network.
#[async_trait]
pub trait NetworkProbe: Send + Sync + std::fmt::Debug {
    /// The network this probe reads.
    fn network(&self) -> Network;

    /// Fetch a block header.
    async fn block(&self, tag: BlockTag) -> Result<BlockHeader, ProbeError>;

    /// Fetch the chain head.
    async fn latest(&self) -> Result<BlockHeader, ProbeError> {
        self.block(BlockTag::Latest).await
    }
}

/// `eth_getBlockByNumber` over HTTP.
#[derive(Debug)]
pub struct JsonRpcProbe {
    client: reqwest::Client,
    network: Network,
    rpc_url: Url,
    next_id: AtomicU64,
}

impl JsonRpcProbe {
    /// Create a probe with its own HTTP client bounded by `timeout`.
    pub fn new(network: Network, rpc_url: Url, timeout: Duration) -> Result<Self, ProbeError> {
        if !network.is_chain() {
            return Err(ProbeError::unavailable(network, "not a chain network"));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::unavailable(network, format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            network,
            rpc_url,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    /// Send a JSON-RPC request and return the `result` field.
    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ProbeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id
        });

        let resp = self
            .client
            .post(self.rpc_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::unavailable(self.network, "request timed out")
                } else {
                    ProbeError::unavailable(self.network, format!("request failed: {e}"))
                }
            })?;

        if !resp.status().is_success() {
            return Err(ProbeError::unavailable(
                self.network,
                format!("HTTP {}", resp.status()),
            ));
        }

        let json: serde_json::Value = resp.json().await.map_err(|e| {
            ProbeError::unavailable(self.network, format!("invalid JSON response: {e}"))
        })?;

        if let Some(error) = json.get("error") {
            let msg = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown RPC error");
            return Err(ProbeError::unavailable(
                self.network,
                format!("RPC error: {msg}"),
            ));
        }

        json.get("result").cloned().ok_or_else(|| {
            ProbeError::unavailable(self.network, "JSON-RPC response missing 'result' field")
        })
    }
}

#[async_trait]
impl NetworkProbe for JsonRpcProbe {
    fn network(&self) -> Network {
        self.network
    }

    async fn block(&self, tag: BlockTag) -> Result<BlockHeader, ProbeError> {
        let result = self
            .rpc_call(
                "eth_getBlockByNumber",
                serde_json::json!([tag.to_param(), false]),
            )
            .await?;
        let header = parse_block(self.network, &result)?;
        tracing::debug!(
            network = %self.network,
            block_number = header.number,
            "fetched block header"
        );
        Ok(header)
    }
}

/// Decode a block object from an `eth_getBlockByNumber` result.
pub(crate) fn parse_block(
    network: Network,
    result: &serde_json::Value,
) -> Result<BlockHeader, ProbeError> {
    if result.is_null() {
        return Err(ProbeError::unavailable(network, "block not found"));
    }
    let field = |name: &str| -> Result<&str, ProbeError> {
        result
            .get(name)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProbeError::unavailable(network, format!("block is missing '{name}'")))
    };

    let number = parse_quantity(field("number")?)
        .ok_or_else(|| ProbeError::unavailable(network, "undecodable block number"))?;
    let timestamp_secs = parse_quantity(field("timestamp")?)
        .ok_or_else(|| ProbeError::unavailable(network, "undecodable block timestamp"))?;
    let hash = field("hash")?;
    if !is_hex_data(hash) {
        return Err(ProbeError::unavailable(network, "undecodable block hash"));
    }

    Ok(BlockHeader {
        number,
        hash: hash.to_string(),
        timestamp_secs,
    })
}

/// Decode a `0x`-prefixed hex quantity.
pub(crate) fn parse_quantity(s: &str) -> Option<u64> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    if digits.is_empty() || digits.len() > 16 {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

fn is_hex_data(s: &str) -> bool {
    s.strip_prefix("0x")
        .is_some_and(|d| !d.is_empty() && d.chars().all(|c| c.is_ascii_hexdigit()))
}

/// The probes available to a process, keyed by network.
#[derive(Debug, Clone, Default)]
pub struct ProbeRegistry {
    probes: BTreeMap<Network, Arc<dyn NetworkProbe>>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`JsonRpcProbe`] per configured endpoint.
    pub fn from_config(config: &AnchorConfig) -> Result<Self, ProbeError> {
        let mut registry = Self::new();
        for (network, url) in &config.endpoints {
            let probe = JsonRpcProbe::new(*network, url.clone(), config.rpc_timeout())?;
            registry.insert(Arc::new(probe));
        }
        Ok(registry)
    }

    /// Register a probe, replacing any existing probe for its network.
    pub fn insert(&mut self, probe: Arc<dyn NetworkProbe>) {
        self.probes.insert(probe.network(), probe);
    }

    pub fn get(&self, network: Network) -> Option<Arc<dyn NetworkProbe>> {
        self.probes.get(&network).cloned()
    }

    pub fn networks(&self) -> impl Iterator<Item = Network> + '_ {
        self.probes.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantities() {
        assert_eq!(parse_quantity("0x112a880"), Some(18_000_000));
        assert_eq!(parse_quantity("0x6553f100"), Some(1_700_000_000));
        assert_eq!(parse_quantity("0x0"), Some(0));
        assert_eq!(parse_quantity("112a880"), None);
        assert_eq!(parse_quantity("0x"), None);
        assert_eq!(parse_quantity("0xzz"), None);
        assert_eq!(parse_quantity("0x1ffffffffffffffff"), None);
    }

    #[test]
    fn block_tag_params() {
        assert_eq!(BlockTag::Latest.to_param(), "latest");
        assert_eq!(BlockTag::Number(18_000_000).to_param(), "0x112a880");
    }

    #[test]
    fn parses_block_object() {
        let result = serde_json::json!({
            "number": "0x112a880",
            "hash": "0xdeadbeef",
            "timestamp": "0x6553f100",
            "transactions": []
        });
        let header = parse_block(Network::Ethereum, &result).unwrap();
        assert_eq!(header.number, 18_000_000);
        assert_eq!(header.hash, "0xdeadbeef");
        assert_eq!(header.timestamp_ms(), 1_700_000_000_000);
    }

    #[test]
    fn rejects_incomplete_blocks() {
        let missing_hash = serde_json::json!({"number": "0x1", "timestamp": "0x1"});
        let bad_hash = serde_json::json!({"number": "0x1", "hash": "dead", "timestamp": "0x1"});
        let numeric = serde_json::json!({"number": 1, "hash": "0xaa", "timestamp": "0x1"});
        for result in [serde_json::Value::Null, missing_hash, bad_hash, numeric] {
            let err = parse_block(Network::Polygon, &result).unwrap_err();
            assert!(matches!(
                err,
                ProbeError::NetworkUnavailable { network: Network::Polygon, .. }
            ));
        }
    }

    #[test]
    fn local_network_has_no_probe() {
        let url = Url::parse("http://127.0.0.1:1").unwrap();
        assert!(JsonRpcProbe::new(Network::LocalVerifiable, url, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn registry_from_default_config_covers_all_chains() {
        let cfg = AnchorConfig::from_lookup(|_| None).unwrap();
        let registry = ProbeRegistry::from_config(&cfg).unwrap();
        let networks: Vec<_> = registry.networks().collect();
        assert_eq!(networks, Network::CHAINS.to_vec());
    }
}
