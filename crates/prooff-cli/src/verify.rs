//! # Verify Subcommand
//!
//! Checks an anchor record read from a file. Accepts a bare record, the
//! output of `prooff anchor` (`{"record": ...}`), or a certificate
//! (`{"anchor": ...}`). Exit code 0 means valid, 2 means invalid.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use prooff_anchor::{AnchorConfig, AnchorRecord, AnchorVerifier, ProbeRegistry, VerificationReport};
use serde_json::Value;

/// Arguments for `prooff verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// JSON file holding the record.
    pub record: PathBuf,
}

pub async fn run_verify(args: &VerifyArgs, config: &AnchorConfig) -> Result<u8> {
    let report = verify_file(&args.record, config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.is_valid {
        Ok(0)
    } else {
        tracing::warn!(outcome = report.outcome(), "anchor record is not valid");
        Ok(2)
    }
}

pub async fn verify_file(path: &Path, config: &AnchorConfig) -> Result<VerificationReport> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let record = extract_record(value)?;

    let verifier = AnchorVerifier::new(ProbeRegistry::from_config(config)?, config.stage_timeout());
    Ok(verifier.verify(&record).await)
}

fn extract_record(mut value: Value) -> Result<AnchorRecord> {
    for wrapper in ["record", "anchor"] {
        if let Some(inner) = value.get_mut(wrapper).map(Value::take) {
            if inner.is_object() {
                return serde_json::from_value(inner)
                    .with_context(|| format!("malformed anchor record under {wrapper:?}"));
            }
        }
    }
    serde_json::from_value(value).context("malformed anchor record")
}

#[cfg(test)]
mod tests {
    use prooff_anchor::Network;

    use super::*;
    use crate::anchor::{create_anchor, AnchorArgs};

    fn offline_config() -> AnchorConfig {
        AnchorConfig::from_lookup(|_| None)
            .unwrap()
            .with_rpc_url(Network::Ethereum, "http://127.0.0.1:1")
            .unwrap()
            .with_rpc_url(Network::Polygon, "http://127.0.0.1:1")
            .unwrap()
            .with_timeouts(1, 1)
    }

    async fn local_record() -> AnchorRecord {
        let args = AnchorArgs {
            content_hash: Some("cd".repeat(32)),
            file: None,
            certificate_id: "CERT-VERIFY".to_string(),
            out: None,
        };
        create_anchor(&args, &offline_config()).await.unwrap().record
    }

    fn write_json(dir: &tempfile::TempDir, value: &impl serde::Serialize) -> PathBuf {
        let path = dir.path().join("input.json");
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn bare_and_wrapped_records_verify() {
        let record = local_record().await;
        let dir = tempfile::tempdir().unwrap();

        let bare = write_json(&dir, &record);
        assert!(verify_file(&bare, &offline_config()).await.unwrap().is_valid);

        let wrapped = write_json(&dir, &serde_json::json!({ "record": record }));
        let report = verify_file(&wrapped, &offline_config()).await.unwrap();
        assert!(report.is_valid);
        assert_eq!(report.chain_confirmed, None);
    }

    #[tokio::test]
    async fn tampered_record_exits_two() {
        let mut record = local_record().await;
        record.content_hash = prooff_core::ContentHash::new("ef".repeat(32)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(&dir, &record);

        let report = verify_file(&path, &offline_config()).await.unwrap();
        assert!(!report.is_valid);
        assert!(!report.digest_matches);

        let code = run_verify(&VerifyArgs { record: path }, &offline_config()).await.unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn garbage_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.json");
        std::fs::write(&path, "{\"network\": 7}").unwrap();
        assert!(verify_file(&path, &offline_config()).await.is_err());
    }
}
