//! Error types for attestation clients.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to an attestation service.
///
/// Every variant is an attestation failure from the lifecycle's point of
/// view; none of them may alter a receipt the caller already holds.
#[derive(Debug, Error)]
pub enum AttestationError {
    /// The calendar (or the helper standing in for it) reported failure.
    #[error("calendar failure: {0}")]
    Calendar(String),

    /// The call did not finish in time.
    #[error("attestation timed out after {0:?}")]
    Timeout(Duration),

    /// Receipt bytes could not be decoded.
    #[error("malformed receipt: {0}")]
    MalformedReceipt(String),

    /// The helper program misbehaved (bad exit, unparseable output).
    #[error("helper error: {0}")]
    Helper(String),

    /// JSON handling failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for attestation operations.
pub type Result<T> = std::result::Result<T, AttestationError>;
