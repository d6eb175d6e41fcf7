//! Receipt lifecycle state machine.
//!
//! ```text
//! NotStarted --stamp--> Stamping --ok--> Pending --upgrade--> Stamping --ok--> Complete
//!                           |                                     |
//!                           +--err--> Error <--------err----------+
//! ```
//!
//! Status only advances when an attestation call completes. A failed call
//! flips the status to `Error` and records the message; the receipt held
//! before the call is never touched. `enable` resets to `NotStarted` and
//! keeps the receipt.
//!
//! A lifecycle is owned by one document. Callers serialize `stamp` and
//! `upgrade`; the `&mut self` receivers enforce that within one task.

use disclose_attest::{bounded, AttestationClient, Receipt};
use disclose_core::{DraftDocument, OpenTimestampsInfo, Sha256Digest, TimestampInfo, TimestampStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::config::DiscloseConfig;
use crate::error::{DiscloseError, Result};

/// Message recorded when a call was abandoned mid-flight.
pub const ABANDONED_MESSAGE: &str = "attestation call abandoned";

/// Current status of a document's receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    NotStarted,
    Stamping,
    Pending,
    Complete,
    Error,
}

impl ReceiptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReceiptStatus::NotStarted => "not_started",
            ReceiptStatus::Stamping => "stamping",
            ReceiptStatus::Pending => "pending",
            ReceiptStatus::Complete => "complete",
            ReceiptStatus::Error => "error",
        }
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of checking a receipt against a digest.
///
/// A mismatch is a negative answer, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The attestation service confirmed the receipt for this digest.
    Verified,
    /// The service could not confirm the receipt (yet).
    NotVerified,
    /// The supplied digest is not the one the receipt was created for.
    DigestMismatch {
        expected: Sha256Digest,
        supplied: Sha256Digest,
    },
}

impl VerifyOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerifyOutcome::Verified)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyOutcome::Verified => "verified",
            VerifyOutcome::NotVerified => "not_verified",
            VerifyOutcome::DigestMismatch { .. } => "digest_mismatch",
        }
    }
}

/// Persisted fields of a lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleSnapshot {
    pub enabled: bool,
    pub status: ReceiptStatus,
    /// Hex-encoded receipt bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_bytes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamped_digest: Option<Sha256Digest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Drives an [`AttestationClient`] for one document's bundle root.
pub struct ReceiptLifecycle<C: AttestationClient> {
    client: C,
    timeout: Duration,
    default_filename: String,

    enabled: bool,
    status: ReceiptStatus,
    receipt: Option<Receipt>,
    receipt_filename: Option<String>,
    stamped_digest: Option<Sha256Digest>,
    last_error: Option<String>,
}

impl<C: AttestationClient> ReceiptLifecycle<C> {
    /// A fresh, enabled lifecycle with no receipt.
    pub fn new(client: C, config: &DiscloseConfig) -> Self {
        Self {
            client,
            timeout: config.attestation_timeout,
            default_filename: config.receipt_filename.clone(),
            enabled: true,
            status: ReceiptStatus::NotStarted,
            receipt: None,
            receipt_filename: None,
            stamped_digest: None,
            last_error: None,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn status(&self) -> ReceiptStatus {
        self.status
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    pub fn receipt_filename(&self) -> Option<&str> {
        self.receipt_filename.as_deref()
    }

    /// The digest the held receipt was created for.
    pub fn stamped_digest(&self) -> Option<&Sha256Digest> {
        self.stamped_digest.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Switch timestamping on or off. Either way the status returns to
    /// `NotStarted`; the receipt is kept.
    pub fn enable(&mut self, on: bool) {
        self.enabled = on;
        self.status = ReceiptStatus::NotStarted;
        self.last_error = None;
        info!(enabled = on, "timestamping toggled");
    }

    /// Submit the bundle root and hold the returned receipt.
    ///
    /// Allowed from `NotStarted` or `Error` while enabled.
    #[instrument(skip_all, fields(root = %short_hex(root)))]
    pub async fn stamp(&mut self, root: &Sha256Digest) -> Result<()> {
        if !self.enabled {
            return Err(DiscloseError::Disabled);
        }
        if !matches!(self.status, ReceiptStatus::NotStarted | ReceiptStatus::Error) {
            return Err(self.invalid("stamp"));
        }

        self.status = ReceiptStatus::Stamping;
        match bounded(self.timeout, self.client.create(root)).await {
            Ok(receipt) => {
                info!(bytes = receipt.len(), "receipt pending");
                self.receipt = Some(receipt);
                self.receipt_filename = Some(self.default_filename.clone());
                self.stamped_digest = Some(*root);
                self.last_error = None;
                self.status = ReceiptStatus::Pending;
                Ok(())
            }
            Err(err) => Err(self.fail("stamp", err.into())),
        }
    }

    /// Ask the service to complete the held receipt.
    ///
    /// Allowed from `Pending` or `Complete` while enabled and holding a receipt.
    #[instrument(skip_all)]
    pub async fn upgrade(&mut self) -> Result<()> {
        if !self.enabled {
            return Err(DiscloseError::Disabled);
        }
        if !matches!(self.status, ReceiptStatus::Pending | ReceiptStatus::Complete) {
            return Err(self.invalid("upgrade"));
        }
        let Some(current) = self.receipt.clone() else {
            return Err(DiscloseError::NoReceipt);
        };

        self.status = ReceiptStatus::Stamping;
        match bounded(self.timeout, self.client.upgrade(&current)).await {
            Ok(upgraded) => {
                info!(changed = upgraded != current, "receipt complete");
                self.receipt = Some(upgraded);
                self.last_error = None;
                self.status = ReceiptStatus::Complete;
                Ok(())
            }
            Err(err) => Err(self.fail("upgrade", err.into())),
        }
    }

    /// Check the held receipt against `digest`. Never changes state.
    ///
    /// A digest other than the stamped one is a mismatch and the service is
    /// not consulted.
    #[instrument(skip_all, fields(digest = %short_hex(digest)))]
    pub async fn verify(&self, digest: &Sha256Digest) -> Result<VerifyOutcome> {
        let receipt = self.receipt.as_ref().ok_or(DiscloseError::NoReceipt)?;
        if let Some(expected) = self.stamped_digest {
            if expected != *digest {
                return Ok(VerifyOutcome::DigestMismatch {
                    expected,
                    supplied: *digest,
                });
            }
        }
        let verified = bounded(self.timeout, self.client.verify(receipt, digest)).await?;
        Ok(if verified {
            VerifyOutcome::Verified
        } else {
            VerifyOutcome::NotVerified
        })
    }

    /// Human-readable description of the held receipt.
    pub async fn describe(&self) -> Result<String> {
        let receipt = self.receipt.as_ref().ok_or(DiscloseError::NoReceipt)?;
        Ok(bounded(self.timeout, self.client.describe(receipt)).await?)
    }

    /// Turn a `Stamping` status left behind by a dropped call into `Error`.
    ///
    /// Returns whether anything changed.
    pub fn recover_abandoned(&mut self) -> bool {
        if self.status != ReceiptStatus::Stamping {
            return false;
        }
        warn!("recovering abandoned attestation call");
        self.status = ReceiptStatus::Error;
        self.last_error = Some(ABANDONED_MESSAGE.to_string());
        true
    }

    /// The `timestamps.opentimestamps` block for the document.
    pub fn timestamp_info(&self) -> OpenTimestampsInfo {
        let status = match self.status {
            ReceiptStatus::NotStarted => Some(TimestampStatus::None),
            ReceiptStatus::Pending => Some(TimestampStatus::Pending),
            ReceiptStatus::Complete => Some(TimestampStatus::Complete),
            ReceiptStatus::Stamping | ReceiptStatus::Error => None,
        };
        OpenTimestampsInfo {
            enabled: Some(self.enabled),
            status,
            receipt_sha256: self.receipt.as_ref().map(Receipt::sha256),
            receipt_filename: self.receipt_filename.clone(),
        }
    }

    /// Record the timestamp block on a draft. The document digest is
    /// unaffected.
    pub fn apply_to(&self, draft: &mut DraftDocument) {
        let timestamps = draft.timestamps.get_or_insert_with(TimestampInfo::default);
        timestamps.opentimestamps = Some(self.timestamp_info());
    }

    pub fn snapshot(&self) -> LifecycleSnapshot {
        LifecycleSnapshot {
            enabled: self.enabled,
            status: self.status,
            receipt_bytes: self.receipt.as_ref().map(|r| hex::encode(r.as_bytes())),
            receipt_filename: self.receipt_filename.clone(),
            stamped_digest: self.stamped_digest,
            last_error: self.last_error.clone(),
        }
    }

    /// Rebuild a lifecycle from a snapshot.
    ///
    /// A snapshot taken mid-call restores as `Error`.
    pub fn restore(client: C, config: &DiscloseConfig, snapshot: LifecycleSnapshot) -> Result<Self> {
        let receipt = snapshot
            .receipt_bytes
            .map(|h| hex::decode(h).map(Receipt::from))
            .transpose()
            .map_err(|e| DiscloseError::Config(format!("receipt bytes: {e}")))?;

        let mut lifecycle = Self::new(client, config);
        lifecycle.enabled = snapshot.enabled;
        lifecycle.status = snapshot.status;
        lifecycle.receipt = receipt;
        lifecycle.receipt_filename = snapshot.receipt_filename;
        lifecycle.stamped_digest = snapshot.stamped_digest;
        lifecycle.last_error = snapshot.last_error;

        if matches!(lifecycle.status, ReceiptStatus::Pending | ReceiptStatus::Complete)
            && lifecycle.receipt.is_none()
        {
            return Err(DiscloseError::NoReceipt);
        }
        lifecycle.recover_abandoned();
        Ok(lifecycle)
    }

    fn invalid(&self, operation: &'static str) -> DiscloseError {
        DiscloseError::InvalidTransition {
            operation,
            status: self.status,
        }
    }

    fn fail(&mut self, operation: &'static str, err: DiscloseError) -> DiscloseError {
        warn!(operation, error = %err, "attestation call failed");
        self.status = ReceiptStatus::Error;
        self.last_error = Some(err.to_string());
        err
    }
}

fn short_hex(digest: &Sha256Digest) -> String {
    digest.to_hex()[..16].to_string()
}

impl<C: AttestationClient> fmt::Debug for ReceiptLifecycle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiptLifecycle")
            .field("enabled", &self.enabled)
            .field("status", &self.status)
            .field("receipt", &self.receipt)
            .field("last_error", &self.last_error)
            .finish()
    }
}
