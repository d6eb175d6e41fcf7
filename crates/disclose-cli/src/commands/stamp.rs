//! Stamp command implementation.
//!
//! Either stamps a bare digest, or stamps a hashed manifest's bundle root
//! and records the pending receipt in the manifest.

use anyhow::{Context, Result};
use disclose::Engine;
use serde_json::json;
use std::path::Path;

use super::{
    call, client, load_config, manifest_dir, parse_digest, read_manifest, receipt_path,
    write_manifest, write_receipt,
};
use crate::output::Report;

pub async fn run(digest: &str, out: &Path, calendars: Option<&str>) -> Result<Report> {
    let digest = parse_digest(digest)?;
    let config = load_config(calendars, None)?;
    let client = client(&config);

    let receipt = call(&config, client.create(&digest)).await?;
    write_receipt(out, &receipt).await?;

    Ok(Report::Done(json!({
        "receipt_path": out.display().to_string(),
        "receipt_sha256": receipt.sha256(),
    })))
}

pub async fn run_manifest(
    manifest: &Path,
    out: Option<&Path>,
    calendars: Option<&str>,
) -> Result<Report> {
    let mut config = load_config(calendars, None)?;
    let out = receipt_path(&manifest_dir(manifest), out, &config.receipt_filename);
    if let Some(name) = out.file_name().and_then(|n| n.to_str()) {
        config.receipt_filename = name.to_string();
    }

    let mut draft = read_manifest(manifest).await?;
    let engine = Engine::from_config(config);
    let lifecycle = engine
        .stamp_document(&mut draft)
        .await
        .context("stamping bundle root")?;
    let receipt = lifecycle.receipt().context("stamp left no receipt")?;

    write_receipt(&out, receipt).await?;
    write_manifest(manifest, &draft).await?;

    Ok(Report::Done(json!({
        "receipt_path": out.display().to_string(),
        "receipt_sha256": receipt.sha256(),
        "bundle_root_sha256": lifecycle.stamped_digest(),
        "status": lifecycle.status(),
    })))
}
