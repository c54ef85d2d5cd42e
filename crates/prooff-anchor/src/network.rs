//! # Networks
//!
//! The chains an anchor can be bound to, plus the local timestamp variant.
//! Ethereum and Polygon make up the default fallback order. Arbitrum has an
//! endpoint and an explorer and can be probed, but is only tried when the
//! operator adds it to `PROOFF_FALLBACK_ORDER`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Network an anchor record is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    /// Ethereum mainnet.
    Ethereum,
    /// Polygon PoS.
    Polygon,
    /// Arbitrum One.
    Arbitrum,
    /// No chain was reachable; anchored to the local wall clock.
    LocalVerifiable,
}

impl Network {
    /// Every chain network, in catalogue order.
    pub const CHAINS: [Network; 3] = [Network::Ethereum, Network::Polygon, Network::Arbitrum];

    /// The fallback order used when none is configured.
    pub const DEFAULT_FALLBACK_ORDER: [Network; 2] = [Network::Ethereum, Network::Polygon];

    /// Wire name, as used in canonical objects and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Polygon => "polygon",
            Self::Arbitrum => "arbitrum",
            Self::LocalVerifiable => "local_verifiable",
        }
    }

    /// True for networks backed by a blockchain.
    pub fn is_chain(&self) -> bool {
        !matches!(self, Self::LocalVerifiable)
    }

    /// EVM chain id.
    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Self::Ethereum => Some(1),
            Self::Polygon => Some(137),
            Self::Arbitrum => Some(42161),
            Self::LocalVerifiable => None,
        }
    }

    /// Public JSON-RPC endpoint used when none is configured.
    pub fn default_rpc_url(&self) -> Option<&'static str> {
        match self {
            Self::Ethereum => Some("https://eth.llamarpc.com"),
            Self::Polygon => Some("https://polygon-rpc.com"),
            Self::Arbitrum => Some("https://arb1.arbitrum.io/rpc"),
            Self::LocalVerifiable => None,
        }
    }

    /// Environment variable that overrides the RPC endpoint.
    pub fn rpc_url_env_var(&self) -> Option<&'static str> {
        match self {
            Self::Ethereum => Some("PROOFF_ETHEREUM_RPC_URL"),
            Self::Polygon => Some("PROOFF_POLYGON_RPC_URL"),
            Self::Arbitrum => Some("PROOFF_ARBITRUM_RPC_URL"),
            Self::LocalVerifiable => None,
        }
    }

    fn explorer_base(&self) -> Option<&'static str> {
        match self {
            Self::Ethereum => Some("https://etherscan.io"),
            Self::Polygon => Some("https://polygonscan.com"),
            Self::Arbitrum => Some("https://arbiscan.io"),
            Self::LocalVerifiable => None,
        }
    }

    /// Block-explorer URL for a block on this network.
    pub fn explorer_block_url(&self, block_number: u64) -> Option<String> {
        self.explorer_base()
            .map(|base| format!("{base}/block/{block_number}"))
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a network name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown network: {0:?}")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ethereum" | "eth" => Ok(Self::Ethereum),
            "polygon" | "matic" => Ok(Self::Polygon),
            "arbitrum" | "arb" => Ok(Self::Arbitrum),
            "local_verifiable" | "local" => Ok(Self::LocalVerifiable),
            other => Err(UnknownNetwork(other.to_string())),
        }
    }
}
