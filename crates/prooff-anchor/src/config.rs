//! Anchoring configuration.
//!
//! Endpoints default to public JSON-RPC providers. Override via environment
//! variables or the `with_*` builders (CLI flags, tests).

use std::collections::BTreeMap;
use std::time::Duration;

use url::Url;

use crate::network::Network;

/// Default HTTP timeout for one JSON-RPC call.
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Default fail-fast timeout for one fallback stage.
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 12;

/// Configuration for probes and the fallback chain.
#[derive(Debug, Clone)]
pub struct AnchorConfig {
    /// JSON-RPC endpoint per chain network.
    pub endpoints: BTreeMap<Network, Url>,
    /// HTTP client timeout for each RPC call, in seconds.
    pub rpc_timeout_secs: u64,
    /// Fail-fast timeout for each fallback stage, in seconds.
    pub stage_timeout_secs: u64,
    /// Chains tried in order before the local timestamp fallback.
    pub fallback_order: Vec<Network>,
}

impl AnchorConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PROOFF_ETHEREUM_RPC_URL` (default: `https://eth.llamarpc.com`)
    /// - `PROOFF_POLYGON_RPC_URL` (default: `https://polygon-rpc.com`)
    /// - `PROOFF_ARBITRUM_RPC_URL` (default: `https://arb1.arbitrum.io/rpc`)
    /// - `PROOFF_RPC_TIMEOUT_SECS` (default: 10)
    /// - `PROOFF_STAGE_TIMEOUT_SECS` (default: 12)
    /// - `PROOFF_FALLBACK_ORDER` (default: `ethereum,polygon`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut endpoints = BTreeMap::new();
        for network in Network::CHAINS {
            if let (Some(var), Some(default)) = (network.rpc_url_env_var(), network.default_rpc_url())
            {
                let raw = lookup(var).unwrap_or_else(|| default.to_string());
                endpoints.insert(network, parse_url(var, &raw)?);
            }
        }

        let rpc_timeout_secs = env_secs(&lookup, "PROOFF_RPC_TIMEOUT_SECS", DEFAULT_RPC_TIMEOUT_SECS)?;
        let stage_timeout_secs =
            env_secs(&lookup, "PROOFF_STAGE_TIMEOUT_SECS", DEFAULT_STAGE_TIMEOUT_SECS)?;

        let fallback_order = match lookup("PROOFF_FALLBACK_ORDER") {
            Some(raw) => parse_fallback_order(&raw)?,
            None => Network::DEFAULT_FALLBACK_ORDER.to_vec(),
        };

        let config = Self {
            endpoints,
            rpc_timeout_secs,
            stage_timeout_secs,
            fallback_order,
        };
        config.validate()?;
        Ok(config)
    }

    /// Override the endpoint for one chain.
    pub fn with_rpc_url(mut self, network: Network, url: &str) -> Result<Self, ConfigError> {
        if !network.is_chain() {
            return Err(ConfigError::LocalNotProbeable);
        }
        let var = network.rpc_url_env_var().unwrap_or("rpc_url");
        self.endpoints.insert(network, parse_url(var, url)?);
        Ok(self)
    }

    /// Replace the fallback order.
    pub fn with_fallback_order(mut self, order: Vec<Network>) -> Result<Self, ConfigError> {
        self.fallback_order = order;
        self.validate()?;
        Ok(self)
    }

    /// Replace both timeouts.
    pub fn with_timeouts(mut self, rpc_timeout_secs: u64, stage_timeout_secs: u64) -> Self {
        self.rpc_timeout_secs = rpc_timeout_secs;
        self.stage_timeout_secs = stage_timeout_secs;
        self
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_timeout_secs == 0 || self.stage_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "timeout".to_string(),
                "must be at least 1 second".to_string(),
            ));
        }
        let mut seen = Vec::with_capacity(self.fallback_order.len());
        for network in &self.fallback_order {
            if !network.is_chain() {
                return Err(ConfigError::LocalNotProbeable);
            }
            if seen.contains(network) {
                return Err(ConfigError::DuplicateNetwork(*network));
            }
            if !self.endpoints.contains_key(network) {
                return Err(ConfigError::MissingEndpoint(*network));
            }
            seen.push(*network);
        }
        Ok(())
    }
}

/// Parse a comma-separated fallback order. An empty string means no chain
/// is tried and every anchor is local.
pub fn parse_fallback_order(raw: &str) -> Result<Vec<Network>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let network: Network = s
                .parse()
                .map_err(|_| ConfigError::UnknownNetwork(s.to_string()))?;
            if !network.is_chain() {
                return Err(ConfigError::LocalNotProbeable);
            }
            Ok(network)
        })
        .collect()
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl(
            var.to_string(),
            format!("unsupported scheme {other:?}"),
        )),
    }
}

fn env_secs<F>(lookup: &F, var: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(var.to_string(), raw.clone())),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
    #[error("unknown network {0:?} in fallback order")]
    UnknownNetwork(String),
    #[error("the local timestamp fallback is implicit and cannot be probed")]
    LocalNotProbeable,
    #[error("network {0} appears more than once in the fallback order")]
    DuplicateNetwork(Network),
    #[error("no RPC endpoint configured for {0}")]
    MissingEndpoint(Network),
}
