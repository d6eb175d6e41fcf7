//! Bundle root aggregation.
//!
//! The tree has one fixed topology: the document digest is the first leaf,
//! followed by the proof digests sorted ascending by their bytes. Levels
//! with an odd number of nodes duplicate their last node, and each parent
//! is `SHA256(left || right)`. A lone leaf is paired with itself, so the
//! root is never the leaf itself.

use tracing::debug;

use crate::crypto::Sha256Digest;
use crate::document::ProofItem;
use crate::error::{CoreError, Result};

/// Fold a non-empty leaf list into a root.
///
/// Returns `None` for an empty list.
pub fn merkle_root(leaves: &[Sha256Digest]) -> Option<Sha256Digest> {
    if leaves.is_empty() {
        return None;
    }

    let mut level = leaves.to_vec();
    loop {
        if level.len() % 2 == 1 {
            let last = level[level.len() - 1];
            level.push(last);
        }
        level = level
            .chunks_exact(2)
            .map(|pair| Sha256Digest::hash_pair(&pair[0], &pair[1]))
            .collect();
        if level.len() == 1 {
            return Some(level[0]);
        }
    }
}

/// Compute the bundle root for a document digest and a set of proof digests.
///
/// The proof digests are treated as a multiset: their input order does not
/// affect the result.
pub fn bundle_root(document: &Sha256Digest, proofs: &[Sha256Digest]) -> Sha256Digest {
    let mut sorted = proofs.to_vec();
    sorted.sort();

    let mut leaves = Vec::with_capacity(sorted.len() + 1);
    leaves.push(*document);
    leaves.extend(sorted);

    debug!(leaves = leaves.len(), "aggregating bundle root");

    // leaves always holds the document digest
    merkle_root(&leaves).unwrap_or_else(|| Sha256Digest::hash_pair(document, document))
}

/// Compute the bundle root over proof items.
///
/// Every item must carry a digest. Items without one are reported together
/// in `IncompleteProofSet` and nothing is aggregated.
pub fn bundle_root_for_items(document: &Sha256Digest, items: &[ProofItem]) -> Result<Sha256Digest> {
    let missing: Vec<String> = items
        .iter()
        .filter(|item| item.sha256.is_none())
        .map(|item| item.id.clone())
        .collect();
    if !missing.is_empty() {
        return Err(CoreError::IncompleteProofSet { missing });
    }

    let digests: Vec<Sha256Digest> = items.iter().filter_map(|item| item.sha256).collect();
    Ok(bundle_root(document, &digests))
}
