//! The engine facade.

use disclose_attest::{AttestationClient, Receipt};
use disclose_core::{build_hashes, recompute_root, DraftDocument, HashesArtifact, TimestampStatus};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::config::DiscloseConfig;
use crate::error::{DiscloseError, Result};
use crate::lifecycle::{LifecycleSnapshot, ReceiptLifecycle, ReceiptStatus, VerifyOutcome};
use crate::pipeline::Pipeline;

/// Ties configuration, hashing and attestation together.
///
/// Holds no per-document state; each document gets its own lifecycle from
/// [`Engine::lifecycle`].
pub struct Engine<C: AttestationClient> {
    config: DiscloseConfig,
    client: Arc<C>,
    pipeline: Pipeline,
}

impl<C: AttestationClient> Engine<C> {
    pub fn new(client: C, config: DiscloseConfig) -> Self {
        Self {
            pipeline: Pipeline::new(config.clone()),
            client: Arc::new(client),
            config,
        }
    }

    pub fn config(&self) -> &DiscloseConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Hash every artifact of `draft` and store its bundle root.
    pub async fn seal(&self, draft: &mut DraftDocument, base_dir: &Path) -> Result<HashesArtifact> {
        self.pipeline.seal(draft, base_dir).await
    }

    /// A fresh lifecycle sharing this engine's client.
    pub fn lifecycle(&self) -> ReceiptLifecycle<Arc<C>> {
        ReceiptLifecycle::new(Arc::clone(&self.client), &self.config)
    }

    /// Stamp the bundle root of a hashed draft and record the
    /// `timestamps.opentimestamps` block on it.
    ///
    /// Every proof must already carry its digest.
    pub async fn stamp_document(&self, draft: &mut DraftDocument) -> Result<ReceiptLifecycle<Arc<C>>> {
        let hashes = recompute_root(draft)?;
        let mut lifecycle = self.lifecycle();
        lifecycle.stamp(&hashes.bundle_root_sha256).await?;
        lifecycle.apply_to(draft);
        Ok(lifecycle)
    }

    /// Pick up the lifecycle a draft recorded, holding `receipt`.
    ///
    /// The receipt must hash to the recorded `receipt_sha256` when one is
    /// present. A recorded `complete` resumes as complete; anything else
    /// resumes as pending.
    pub fn resume(&self, draft: &DraftDocument, receipt: Receipt) -> Result<ReceiptLifecycle<Arc<C>>> {
        let info = draft
            .timestamps
            .as_ref()
            .and_then(|t| t.opentimestamps.as_ref());

        if let Some(recorded) = info.and_then(|i| i.receipt_sha256) {
            let actual = receipt.sha256();
            if recorded != actual {
                return Err(DiscloseError::ReceiptMismatch { recorded, actual });
            }
        }

        let status = match info.and_then(|i| i.status) {
            Some(TimestampStatus::Complete) => ReceiptStatus::Complete,
            _ => ReceiptStatus::Pending,
        };
        debug!(%status, "resuming recorded lifecycle");

        let snapshot = LifecycleSnapshot {
            enabled: info.and_then(|i| i.enabled).unwrap_or(true),
            status,
            receipt_bytes: Some(hex::encode(receipt.as_bytes())),
            receipt_filename: info.and_then(|i| i.receipt_filename.clone()),
            stamped_digest: draft.proof.bundle_root_sha256,
            last_error: None,
        };
        ReceiptLifecycle::restore(Arc::clone(&self.client), &self.config, snapshot)
    }

    /// Check a lifecycle's receipt against the root recomputed from `draft`.
    ///
    /// An edit to the document since stamping shows up as a digest mismatch.
    pub async fn verify_document(
        &self,
        lifecycle: &ReceiptLifecycle<Arc<C>>,
        draft: &DraftDocument,
    ) -> Result<VerifyOutcome> {
        let hashes = build_hashes(draft)?;
        lifecycle.verify(&hashes.bundle_root_sha256).await
    }
}

impl Engine<Box<dyn AttestationClient>> {
    /// Build an engine with the client the configuration selects.
    pub fn from_config(config: DiscloseConfig) -> Self {
        let client = config.attestation_client();
        Self::new(client, config)
    }
}
