//! AttestationClient trait: the abstract interface to a timestamping service.
//!
//! The engine never talks to calendar servers itself. Implementations
//! include the process-backed [`crate::HelperClient`] and the deterministic
//! [`crate::MockAttestationClient`].

use async_trait::async_trait;
use disclose_core::Sha256Digest;
use std::future::Future;
use std::time::Duration;

use crate::error::{AttestationError, Result};
use crate::receipt::Receipt;

/// The AttestationClient trait: async interface to an append-only
/// timestamping network.
///
/// # Design Notes
///
/// - **One digest per receipt**: `verify` must be called with the digest
///   the receipt was created for.
/// - **Atomic calls**: a failed call returns an error and leaves no partial
///   receipt behind.
/// - **Unbounded by default**: callers wrap calls with [`bounded`].
#[async_trait]
pub trait AttestationClient: Send + Sync {
    /// Submit a digest and obtain a (typically pending) receipt.
    async fn create(&self, digest: &Sha256Digest) -> Result<Receipt>;

    /// Try to complete pending attestations in a receipt.
    ///
    /// Returns the upgraded receipt, or the same bytes if nothing changed.
    async fn upgrade(&self, receipt: &Receipt) -> Result<Receipt>;

    /// Check that a receipt attests to `digest`.
    async fn verify(&self, receipt: &Receipt, digest: &Sha256Digest) -> Result<bool>;

    /// Human-readable summary of a receipt.
    async fn describe(&self, receipt: &Receipt) -> Result<String>;
}

#[async_trait]
impl<T: AttestationClient + ?Sized> AttestationClient for Box<T> {
    async fn create(&self, digest: &Sha256Digest) -> Result<Receipt> {
        (**self).create(digest).await
    }

    async fn upgrade(&self, receipt: &Receipt) -> Result<Receipt> {
        (**self).upgrade(receipt).await
    }

    async fn verify(&self, receipt: &Receipt, digest: &Sha256Digest) -> Result<bool> {
        (**self).verify(receipt, digest).await
    }

    async fn describe(&self, receipt: &Receipt) -> Result<String> {
        (**self).describe(receipt).await
    }
}

#[async_trait]
impl<T: AttestationClient + ?Sized> AttestationClient for std::sync::Arc<T> {
    async fn create(&self, digest: &Sha256Digest) -> Result<Receipt> {
        (**self).create(digest).await
    }

    async fn upgrade(&self, receipt: &Receipt) -> Result<Receipt> {
        (**self).upgrade(receipt).await
    }

    async fn verify(&self, receipt: &Receipt, digest: &Sha256Digest) -> Result<bool> {
        (**self).verify(receipt, digest).await
    }

    async fn describe(&self, receipt: &Receipt) -> Result<String> {
        (**self).describe(receipt).await
    }
}

/// Run an attestation call with a deadline.
///
/// The future is dropped when the deadline passes, so an abandoned call
/// surfaces as [`AttestationError::Timeout`] rather than hanging.
pub async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(AttestationError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let value = bounded(Duration::from_secs(1), async { Ok::<_, AttestationError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result: Result<()> = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(AttestationError::Timeout(_))));
    }
}
