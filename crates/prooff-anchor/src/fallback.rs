//! # Fallback Chain
//!
//! An ordered list of `(probe, fail-fast timeout)` stages followed by the
//! local timestamp sentinel. Stages are walked in order and the first one
//! that returns a block header wins. A stage that errors or outlives its
//! timeout is recorded as an [`Attempt`] and the walk moves on.
//!
//! [`FallbackChain::resolve`] cannot fail: when every stage is exhausted the
//! result is [`Resolution::Local`]. There is no retry and no backoff.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::{AnchorConfig, ConfigError};
use crate::error::ProbeError;
use crate::network::Network;
use crate::probe::{BlockHeader, NetworkProbe, ProbeRegistry};

/// One chain stage.
#[derive(Debug, Clone)]
pub struct Stage {
    pub probe: Arc<dyn NetworkProbe>,
    pub timeout: Duration,
}

/// A failed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub network: Network,
    pub reason: String,
}

/// What the chain settled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A chain answered.
    Chain { network: Network, header: BlockHeader },
    /// No chain answered; anchor to the local clock.
    Local,
}

impl Resolution {
    pub fn network(&self) -> Network {
        match self {
            Self::Chain { network, .. } => *network,
            Self::Local => Network::LocalVerifiable,
        }
    }
}

/// Result of walking the chain, with the failed stages that preceded it.
#[derive(Debug, Clone)]
pub struct FallbackOutcome {
    pub resolution: Resolution,
    pub attempts: Vec<Attempt>,
}

/// The ordered stages tried before the local fallback.
#[derive(Debug, Clone, Default)]
pub struct FallbackChain {
    stages: Vec<Stage>,
}

impl FallbackChain {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Build stages for `config.fallback_order` from the registry.
    pub fn from_config(config: &AnchorConfig, registry: &ProbeRegistry) -> Result<Self, ConfigError> {
        let stages = config
            .fallback_order
            .iter()
            .map(|network| {
                registry
                    .get(*network)
                    .map(|probe| Stage {
                        probe,
                        timeout: config.stage_timeout(),
                    })
                    .ok_or(ConfigError::MissingEndpoint(*network))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Walk the stages; fall back to [`Resolution::Local`] when all fail.
    pub async fn resolve(&self) -> FallbackOutcome {
        let mut attempts = Vec::new();
        for stage in &self.stages {
            let network = stage.probe.network();
            let result = match tokio::time::timeout(stage.timeout, stage.probe.latest()).await {
                Ok(result) => result,
                Err(_) => Err(ProbeError::NetworkUnavailable {
                    network,
                    reason: format!("stage timed out after {}ms", stage.timeout.as_millis()),
                }),
            };
            match result {
                Ok(header) => {
                    tracing::info!(
                        network = %network,
                        block_number = header.number,
                        failed_stages = attempts.len(),
                        "anchoring to chain block"
                    );
                    return FallbackOutcome {
                        resolution: Resolution::Chain { network, header },
                        attempts,
                    };
                }
                Err(err) => {
                    tracing::warn!(network = %network, reason = err.reason(), "probe failed, falling back");
                    attempts.push(Attempt {
                        network,
                        reason: err.reason().to_string(),
                    });
                }
            }
        }
        tracing::warn!(
            failed_stages = attempts.len(),
            "no chain reachable, anchoring to local timestamp"
        );
        FallbackOutcome {
            resolution: Resolution::Local,
            attempts,
        }
    }
}
