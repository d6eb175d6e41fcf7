//! Hash command implementation.
//!
//! Hashes every file proof of a manifest relative to the manifest's
//! directory, stores the bundle root in the manifest and writes the hashes
//! artifact.

use anyhow::{Context, Result};
use disclose::{DiscloseConfig, Pipeline};
use serde_json::json;
use std::path::{Path, PathBuf};

use super::{manifest_dir, read_manifest, write_manifest};
use crate::output::Report;

pub const DEFAULT_HASHES_FILENAME: &str = "hashes.json";

pub async fn run(manifest: &Path, out: Option<PathBuf>) -> Result<Report> {
    let config = DiscloseConfig::from_env()?;
    let base_dir = manifest_dir(manifest);
    let out = out.unwrap_or_else(|| base_dir.join(DEFAULT_HASHES_FILENAME));

    let mut draft = read_manifest(manifest).await?;
    let hashes = Pipeline::new(config).seal(&mut draft, &base_dir).await?;

    disclose::files::write_hashes(&out, &hashes)
        .await
        .with_context(|| format!("writing {}", out.display()))?;
    write_manifest(manifest, &draft).await?;

    Ok(Report::Done(json!({
        "manifest_sha256": hashes.manifest_sha256,
        "bundle_root_sha256": hashes.bundle_root_sha256,
        "hashes_path": out.display().to_string(),
    })))
}
