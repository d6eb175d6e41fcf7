//! Reading and writing documents, hashes artifacts and receipts.

use disclose_attest::Receipt;
use disclose_core::{DraftDocument, HashesArtifact};
use std::path::Path;

use crate::error::Result;

pub async fn read_draft(path: &Path) -> Result<DraftDocument> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(DraftDocument::from_json_str(&text)?)
}

pub async fn write_draft(path: &Path, draft: &DraftDocument) -> Result<()> {
    tokio::fs::write(path, draft.to_json_pretty()?).await?;
    Ok(())
}

/// Write `hashes.json` (pretty JSON).
pub async fn write_hashes(path: &Path, hashes: &HashesArtifact) -> Result<()> {
    tokio::fs::write(path, hashes.to_json_pretty()?).await?;
    Ok(())
}

pub async fn read_hashes(path: &Path) -> Result<HashesArtifact> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(HashesArtifact::from_json_str(&text)?)
}

pub async fn read_receipt(path: &Path) -> Result<Receipt> {
    Ok(Receipt::from(tokio::fs::read(path).await?))
}

/// Write a receipt, creating parent directories as needed.
pub async fn write_receipt(path: &Path, receipt: &Receipt) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, receipt.as_bytes()).await?;
    Ok(())
}
