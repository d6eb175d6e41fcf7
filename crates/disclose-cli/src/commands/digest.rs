//! Digest command implementation.

use anyhow::Result;
use disclose::{digest_file, DiscloseConfig};
use serde_json::json;
use std::path::Path;

use crate::output::Report;

pub async fn run(file: &Path) -> Result<Report> {
    let config = DiscloseConfig::from_env()?;
    let source = digest_file(file, config.offload_threshold).await?;
    Ok(Report::Done(json!({
        "sha256": source.digest,
        "size_bytes": source.size_bytes,
    })))
}
