//! # Anchor Subcommand
//!
//! Runs the same fallback chain the API uses, against an in-process store.
//! The record is printed, and written to `--out` when given so that
//! `prooff verify` can check it later.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use prooff_anchor::{AnchorConfig, AnchorOutcome, AnchorRequest, AnchorService, InMemoryAnchorStore};
use prooff_core::{CertificateId, ContentHash, SystemClock};

use crate::hash::hash_path;

/// Arguments for `prooff anchor`.
#[derive(Args, Debug)]
pub struct AnchorArgs {
    /// Hex SHA-256 of the work.
    #[arg(long, required_unless_present = "file", conflicts_with = "file")]
    pub content_hash: Option<String>,

    /// Hash this file instead of passing `--content-hash`.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Certificate the anchor belongs to.
    #[arg(long)]
    pub certificate_id: String,

    /// Write the anchor record as JSON to this path.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub async fn run_anchor(args: &AnchorArgs, config: &AnchorConfig) -> Result<u8> {
    let outcome = create_anchor(args, config).await?;
    for attempt in &outcome.attempts {
        tracing::warn!(network = %attempt.network, reason = %attempt.reason, "stage skipped");
    }
    tracing::info!(
        network = %outcome.record.network,
        certificate_id = %outcome.record.certificate_id,
        "anchor created"
    );

    if let Some(out) = &args.out {
        let json = serde_json::to_string_pretty(&outcome.record)?;
        std::fs::write(out, json).with_context(|| format!("failed to write {}", out.display()))?;
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(0)
}

pub async fn create_anchor(args: &AnchorArgs, config: &AnchorConfig) -> Result<AnchorOutcome> {
    let raw_hash = match (&args.content_hash, &args.file) {
        (Some(hash), _) => hash.clone(),
        (None, Some(file)) => hash_path(file)?,
        (None, None) => anyhow::bail!("either --content-hash or --file is required"),
    };
    let content_hash = ContentHash::new(raw_hash).context("invalid content hash")?;
    let certificate_id =
        CertificateId::new(args.certificate_id.as_str()).context("invalid certificate id")?;

    let service = AnchorService::from_config(
        config,
        Arc::new(InMemoryAnchorStore::new()),
        Arc::new(SystemClock),
    )?;
    let outcome = service
        .create_anchor(AnchorRequest {
            content_hash,
            certificate_id,
            extra: Default::default(),
        })
        .await?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use prooff_anchor::{AnchorRecord, Network};

    use super::*;

    fn offline_config() -> AnchorConfig {
        AnchorConfig::from_lookup(|_| None)
            .unwrap()
            .with_rpc_url(Network::Ethereum, "http://127.0.0.1:1")
            .unwrap()
            .with_rpc_url(Network::Polygon, "http://127.0.0.1:1")
            .unwrap()
            .with_timeouts(1, 1)
    }

    fn args(out: Option<PathBuf>) -> AnchorArgs {
        AnchorArgs {
            content_hash: Some("ab".repeat(32)),
            file: None,
            certificate_id: "CERT-CLI-1".to_string(),
            out,
        }
    }

    #[tokio::test]
    async fn offline_anchor_falls_back_to_local() {
        let outcome = create_anchor(&args(None), &offline_config()).await.unwrap();
        assert_eq!(outcome.record.network, Network::LocalVerifiable);
        assert_eq!(outcome.attempts.len(), 2);
        assert!(outcome.explorer_urls.is_empty());
    }

    #[tokio::test]
    async fn writes_record_to_out() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("record.json");
        assert_eq!(run_anchor(&args(Some(out.clone())), &offline_config()).await.unwrap(), 0);

        let record: AnchorRecord =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(record.certificate_id.as_str(), "CERT-CLI-1");
        assert_eq!(record.content_hash.as_str(), "ab".repeat(32));
    }

    #[tokio::test]
    async fn anchors_a_file_by_hash() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("work.txt");
        std::fs::write(&work, b"hello").unwrap();
        let args = AnchorArgs {
            content_hash: None,
            file: Some(work),
            certificate_id: "CERT-CLI-2".to_string(),
            out: None,
        };
        let outcome = create_anchor(&args, &offline_config()).await.unwrap();
        assert_eq!(
            outcome.record.content_hash.as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[tokio::test]
    async fn malformed_hash_is_rejected() {
        let mut bad = args(None);
        bad.content_hash = Some("two words".to_string());
        assert!(create_anchor(&bad, &offline_config()).await.is_err());
    }
}
