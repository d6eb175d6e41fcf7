//! Verify command implementation.

use anyhow::Result;
use disclose::{Engine, VerifyOutcome};
use serde_json::json;
use std::path::Path;

use super::{
    call, client, load_config, manifest_dir, parse_digest, read_manifest, read_receipt,
    receipt_path, recorded_receipt_filename,
};
use crate::output::Report;

pub async fn run(receipt_path: &Path, digest: &str, timeout_ms: Option<u64>) -> Result<Report> {
    let digest = parse_digest(digest)?;
    let config = load_config(None, timeout_ms)?;
    let client = client(&config);
    let receipt = read_receipt(receipt_path).await?;

    let verified = call(&config, client.verify(&receipt, &digest)).await?;
    let result = json!({ "verified": verified, "digest": digest });
    Ok(if verified {
        Report::Done(result)
    } else {
        Report::Negative(result)
    })
}

/// Verify a manifest's receipt against the bundle root recomputed from the
/// manifest as it is now.
pub async fn run_manifest(
    manifest: &Path,
    receipt: Option<&Path>,
    timeout_ms: Option<u64>,
) -> Result<Report> {
    let config = load_config(None, timeout_ms)?;
    let draft = read_manifest(manifest).await?;
    let filename = recorded_receipt_filename(&draft).unwrap_or(config.receipt_filename.as_str());
    let path = receipt_path(&manifest_dir(manifest), receipt, filename);
    let held = read_receipt(&path).await?;

    let engine = Engine::from_config(config);
    let lifecycle = engine.resume(&draft, held)?;
    let outcome = engine.verify_document(&lifecycle, &draft).await?;

    let mut result = json!({
        "verified": outcome.is_verified(),
        "outcome": outcome.as_str(),
        "receipt_path": path.display().to_string(),
    });
    if let VerifyOutcome::DigestMismatch { expected, supplied } = outcome {
        result["expected"] = json!(expected);
        result["supplied"] = json!(supplied);
    }
    Ok(if outcome.is_verified() {
        Report::Done(result)
    } else {
        Report::Negative(result)
    })
}
