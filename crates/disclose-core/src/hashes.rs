//! The published hashes artifact.

use serde::{Deserialize, Serialize};

use crate::crypto::Sha256Digest;
use crate::document::DraftDocument;
use crate::error::{CoreError, Result};
use crate::merkle::bundle_root_for_items;

/// Algorithm tag for SHA-256 leaves folded with the bundle Merkle rule.
pub const ALGO: &str = "sha256+merkle/v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofHashEntry {
    pub id: String,
    pub sha256: Sha256Digest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// `{algo, manifest_sha256, proof, bundle_root_sha256}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashesArtifact {
    pub algo: String,
    pub manifest_sha256: Sha256Digest,
    pub proof: Vec<ProofHashEntry>,
    pub bundle_root_sha256: Sha256Digest,
}

impl HashesArtifact {
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::EncodingError(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| CoreError::DecodingError(e.to_string()))
    }

    /// Recompute the root from the recorded digests and compare.
    ///
    /// Lets a third party check an artifact without the document or the
    /// proof files.
    pub fn is_consistent(&self) -> bool {
        let digests: Vec<Sha256Digest> = self.proof.iter().map(|p| p.sha256).collect();
        self.algo == ALGO
            && crate::merkle::bundle_root(&self.manifest_sha256, &digests) == self.bundle_root_sha256
    }
}

/// Build the hashes artifact for a draft.
///
/// Fails with `IncompleteProofSet` if any proof item is unhashed.
pub fn build_hashes(draft: &DraftDocument) -> Result<HashesArtifact> {
    let manifest_sha256 = draft.document_digest()?;
    let bundle_root_sha256 = bundle_root_for_items(&manifest_sha256, &draft.proof.items)?;

    let proof = draft
        .proof
        .items
        .iter()
        .filter_map(|item| {
            item.sha256.map(|sha256| ProofHashEntry {
                id: item.id.clone(),
                sha256,
                size_bytes: item.size_bytes,
                path: item.path.clone(),
            })
        })
        .collect();

    Ok(HashesArtifact {
        algo: ALGO.to_string(),
        manifest_sha256,
        proof,
        bundle_root_sha256,
    })
}

/// Rebuild the artifact and store its root in `proof.bundle_root_sha256`.
///
/// On failure the stored root is cleared, since it no longer describes the
/// proof items.
pub fn recompute_root(draft: &mut DraftDocument) -> Result<HashesArtifact> {
    match build_hashes(draft) {
        Ok(hashes) => {
            draft.proof.bundle_root_sha256 = Some(hashes.bundle_root_sha256);
            Ok(hashes)
        }
        Err(err) => {
            draft.proof.bundle_root_sha256 = None;
            Err(err)
        }
    }
}
