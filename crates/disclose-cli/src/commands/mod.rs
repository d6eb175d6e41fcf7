//! Command implementations.

pub mod digest;
pub mod hash;
pub mod info;
pub mod stamp;
pub mod upgrade;
pub mod verify;

use anyhow::{Context, Result};
use disclose::attest::bounded;
use disclose::config::parse_calendars;
use disclose::{AttestationClient, DiscloseConfig, DraftDocument, Receipt, Sha256Digest};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Receipts of a manifest live here, relative to the manifest's directory.
pub const RECEIPTS_DIR: &str = "receipts";

/// Environment configuration with command-line overrides applied.
pub fn load_config(calendars: Option<&str>, timeout_ms: Option<u64>) -> Result<DiscloseConfig> {
    let mut config = DiscloseConfig::from_env()?;
    if let Some(csv) = calendars {
        config.calendars = parse_calendars(csv);
    }
    if let Some(ms) = timeout_ms {
        config.attestation_timeout = Duration::from_millis(ms);
    }
    Ok(config)
}

pub fn parse_digest(hex: &str) -> Result<Sha256Digest> {
    Sha256Digest::from_hex(hex.trim()).with_context(|| format!("invalid digest {hex:?}"))
}

pub async fn read_receipt(path: &Path) -> Result<Receipt> {
    disclose::files::read_receipt(path)
        .await
        .with_context(|| format!("reading receipt {}", path.display()))
}

/// Run one attestation call under the configured deadline.
pub async fn call<T, F>(config: &DiscloseConfig, call: F) -> Result<T>
where
    F: Future<Output = disclose::attest::Result<T>>,
{
    Ok(bounded(config.attestation_timeout, call).await?)
}

pub fn client(config: &DiscloseConfig) -> Box<dyn AttestationClient> {
    tracing::debug!(deterministic = config.deterministic, "selecting attestation client");
    config.attestation_client()
}

/// Directory proofs and receipts of a manifest are resolved against.
pub fn manifest_dir(manifest: &Path) -> PathBuf {
    manifest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}

/// Receipt path for a manifest: `given` joined onto `dir` when relative,
/// else `receipts/<filename>` under `dir`.
pub fn receipt_path(dir: &Path, given: Option<&Path>, filename: &str) -> PathBuf {
    match given {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => dir.join(path),
        None => dir.join(RECEIPTS_DIR).join(filename),
    }
}

/// Filename of the receipt a manifest recorded, if any.
pub fn recorded_receipt_filename(draft: &DraftDocument) -> Option<&str> {
    draft
        .timestamps
        .as_ref()?
        .opentimestamps
        .as_ref()?
        .receipt_filename
        .as_deref()
}

pub async fn read_manifest(path: &Path) -> Result<DraftDocument> {
    disclose::files::read_draft(path)
        .await
        .with_context(|| format!("reading manifest {}", path.display()))
}

pub async fn write_manifest(path: &Path, draft: &DraftDocument) -> Result<()> {
    disclose::files::write_draft(path, draft)
        .await
        .with_context(|| format!("writing manifest {}", path.display()))
}

pub async fn write_receipt(path: &Path, receipt: &Receipt) -> Result<()> {
    disclose::files::write_receipt(path, receipt)
        .await
        .with_context(|| format!("writing receipt {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_path_resolution() {
        let dir = Path::new("/work/essay");
        assert_eq!(
            receipt_path(dir, None, "bundle-root.ots"),
            PathBuf::from("/work/essay/receipts/bundle-root.ots")
        );
        assert_eq!(
            receipt_path(dir, Some(Path::new("out/r.ots")), "bundle-root.ots"),
            PathBuf::from("/work/essay/out/r.ots")
        );
        assert_eq!(
            receipt_path(dir, Some(Path::new("/tmp/r.ots")), "bundle-root.ots"),
            PathBuf::from("/tmp/r.ots")
        );
    }

    #[test]
    fn test_manifest_dir_of_bare_filename() {
        assert_eq!(manifest_dir(Path::new("disclosure.json")), PathBuf::from("."));
        assert_eq!(manifest_dir(Path::new("a/disclosure.json")), PathBuf::from("a"));
    }
}
