//! Error types for disclose core.

use thiserror::Error;

/// Errors raised while turning a document into canonical bytes.
///
/// Any of these aborts the whole hashing pipeline: no partial digest is
/// ever produced for a document that failed to canonicalize.
#[derive(Debug, Error)]
pub enum CanonicalizationError {
    #[error("unsupported value at {path}: {reason}")]
    UnsupportedValue { path: String, reason: String },

    #[error("non-finite number at {0}")]
    NonFiniteNumber(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Core errors that can occur while hashing and aggregating.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    #[error("read failure: {0}")]
    ReadFailure(String),

    #[error("incomplete proof set: missing digest for {}", missing.join(", "))]
    IncompleteProofSet { missing: Vec<String> },

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
