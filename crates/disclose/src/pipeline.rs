//! Concurrent artifact hashing and aggregation.
//!
//! File proofs are hashed concurrently, bounded by
//! [`DiscloseConfig::hash_concurrency`]. A proof whose file cannot be read
//! ends up with no digest, and aggregation refuses to run while any proof
//! is unhashed.

use disclose_core::{recompute_root, DraftDocument, HashesArtifact, ProofItem, ProofKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::DiscloseConfig;
use crate::error::{DiscloseError, Result};
use crate::hasher::digest_file;

/// Outcome of hashing the proof files of a document.
#[derive(Debug, Default)]
pub struct HashReport {
    /// Ids of proofs whose digest was (re)computed.
    pub hashed: Vec<String>,
    /// Proofs that could not be read, with the reason.
    pub failed: Vec<(String, DiscloseError)>,
    /// Set when a hashing task panicked or was cancelled.
    pub task_error: Option<DiscloseError>,
}

impl HashReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.task_error.is_none()
    }
}

/// Hashes proof artifacts relative to a base directory.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: DiscloseConfig,
}

impl Pipeline {
    pub fn new(config: DiscloseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiscloseConfig {
        &self.config
    }

    /// Hash every file proof that has a path, concurrently.
    ///
    /// Successful proofs get a fresh digest and size. Failed proofs have
    /// their digest cleared so a stale value is never aggregated. Git and
    /// text proofs keep the digest they were created with.
    pub async fn hash_artifacts(&self, items: &mut [ProofItem], base_dir: &Path) -> HashReport {
        let semaphore = Arc::new(Semaphore::new(self.config.hash_concurrency.max(1)));
        let threshold = self.config.offload_threshold;
        let mut tasks = JoinSet::new();

        for (index, item) in items.iter().enumerate() {
            let Some(relative) = item.path.as_deref() else {
                continue;
            };
            if item.kind != ProofKind::File {
                continue;
            }
            let path = resolve(base_dir, relative);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // the semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                (index, digest_file(&path, threshold).await)
            });
        }

        let mut report = HashReport::default();
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "hashing task failed");
                    report.task_error = Some(DiscloseError::Task(e.to_string()));
                    continue;
                }
            };
            let item = &mut items[index];
            match result {
                Ok(source) => {
                    item.sha256 = Some(source.digest);
                    item.size_bytes = Some(source.size_bytes);
                    report.hashed.push(item.id.clone());
                }
                Err(err) => {
                    warn!(proof = %item.id, error = %err, "proof left unhashed");
                    item.sha256 = None;
                    report.failed.push((item.id.clone(), err));
                }
            }
        }

        debug!(
            hashed = report.hashed.len(),
            failed = report.failed.len(),
            "artifact hashing finished"
        );
        report
    }

    /// Hash all artifacts, then compute and store the bundle root.
    ///
    /// Aggregation only happens once every digest has resolved; any missing
    /// digest fails with `IncompleteProofSet`. A failed seal leaves no stored
    /// root behind.
    pub async fn seal(&self, draft: &mut DraftDocument, base_dir: &Path) -> Result<HashesArtifact> {
        let report = self.hash_artifacts(&mut draft.proof.items, base_dir).await;
        if let Some(err) = report.task_error {
            draft.proof.bundle_root_sha256 = None;
            return Err(err);
        }
        Ok(recompute_root(draft)?)
    }
}

fn resolve(base_dir: &Path, relative: &str) -> PathBuf {
    let path = Path::new(relative);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
