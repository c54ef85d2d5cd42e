//! # Hash Subcommand
//!
//! Prints the lowercase hex SHA-256 of a file's raw bytes, the value clients
//! send as `content_hash`. `-` reads standard input.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use prooff_crypto::content_hash_reader;

/// Arguments for `prooff hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// File to hash, or `-` for stdin.
    pub file: PathBuf,
}

pub fn run_hash(args: &HashArgs) -> Result<u8> {
    println!("{}", hash_path(&args.file)?);
    Ok(0)
}

pub fn hash_path(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        return content_hash_reader(std::io::stdin().lock()).context("failed to read stdin");
    }
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    content_hash_reader(BufReader::new(file))
        .with_context(|| format!("failed to read {}", path.display()))
}
