//! Upgrade command implementation.

use anyhow::{Context, Result};
use disclose::Engine;
use serde_json::json;
use std::path::Path;

use super::{
    call, client, load_config, manifest_dir, read_manifest, read_receipt, receipt_path,
    recorded_receipt_filename, write_manifest, write_receipt,
};
use crate::output::Report;

pub async fn run(receipt_path: &Path) -> Result<Report> {
    let config = load_config(None, None)?;
    let client = client(&config);
    let receipt = read_receipt(receipt_path).await?;

    let upgraded = call(&config, client.upgrade(&receipt)).await?;
    let changed = upgraded != receipt;
    if changed {
        write_receipt(receipt_path, &upgraded).await?;
    }

    Ok(Report::Done(json!({ "changed": changed })))
}

/// Upgrade the receipt a manifest recorded and mark the manifest complete.
pub async fn run_manifest(manifest: &Path, receipt: Option<&Path>) -> Result<Report> {
    let config = load_config(None, None)?;
    let mut draft = read_manifest(manifest).await?;
    let filename = recorded_receipt_filename(&draft).unwrap_or(config.receipt_filename.as_str());
    let path = receipt_path(&manifest_dir(manifest), receipt, filename);
    let held = read_receipt(&path).await?;

    let engine = Engine::from_config(config);
    let mut lifecycle = engine.resume(&draft, held.clone())?;
    lifecycle.upgrade().await.context("upgrading receipt")?;
    let upgraded = lifecycle.receipt().context("upgrade left no receipt")?;

    let changed = *upgraded != held;
    if changed {
        write_receipt(&path, upgraded).await?;
    }
    lifecycle.apply_to(&mut draft);
    write_manifest(manifest, &draft).await?;

    Ok(Report::Done(json!({
        "changed": changed,
        "receipt_path": path.display().to_string(),
        "receipt_sha256": upgraded.sha256(),
        "status": lifecycle.status(),
    })))
}
