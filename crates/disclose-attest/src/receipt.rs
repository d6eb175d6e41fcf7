//! Opaque receipt blobs.

use bytes::Bytes;
use disclose_core::Sha256Digest;
use std::fmt;

/// Default file extension for receipt blobs.
pub const RECEIPT_EXTENSION: &str = "ots";

/// An attestation receipt.
///
/// The bytes are opaque to everything except the client that produced them.
/// Cloning is cheap.
#[derive(Clone, PartialEq, Eq)]
pub struct Receipt {
    bytes: Bytes,
}

impl Receipt {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// SHA-256 of the raw receipt bytes.
    pub fn sha256(&self) -> Sha256Digest {
        Sha256Digest::hash(&self.bytes)
    }
}

/// `<artifact>.ots`
pub fn receipt_filename(artifact: &str) -> String {
    format!("{artifact}.{RECEIPT_EXTENSION}")
}

impl fmt::Debug for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Receipt({} bytes, {:?})", self.bytes.len(), self.sha256())
    }
}

impl AsRef<[u8]> for Receipt {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for Receipt {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}
