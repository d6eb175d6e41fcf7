//! Error types for the engine.

use disclose_attest::AttestationError;
use disclose_core::{CanonicalizationError, CoreError, Sha256Digest};
use thiserror::Error;

use crate::lifecycle::ReceiptStatus;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum DiscloseError {
    /// Hashing or aggregation error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// The attestation service failed or timed out.
    #[error("attestation failure: {0}")]
    Attestation(#[from] AttestationError),

    /// The operation is not allowed from the current lifecycle status.
    #[error("cannot {operation} while {status}")]
    InvalidTransition {
        operation: &'static str,
        status: ReceiptStatus,
    },

    /// Timestamping is switched off for this document.
    #[error("timestamping is disabled")]
    Disabled,

    /// The operation needs a receipt and none is held.
    #[error("no receipt held")]
    NoReceipt,

    /// The receipt on disk is not the one the document recorded.
    #[error("receipt {actual} does not match recorded receipt {recorded}")]
    ReceiptMismatch {
        recorded: Sha256Digest,
        actual: Sha256Digest,
    },

    /// Bad configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// A background hashing task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CanonicalizationError> for DiscloseError {
    fn from(err: CanonicalizationError) -> Self {
        DiscloseError::Core(CoreError::from(err))
    }
}

impl DiscloseError {
    /// True for failures reading artifact bytes.
    pub fn is_read_failure(&self) -> bool {
        matches!(self, DiscloseError::Core(CoreError::ReadFailure(_)))
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, DiscloseError>;
