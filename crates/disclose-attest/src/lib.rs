//! # Disclose Attest
//!
//! The boundary between the integrity engine and a timestamping network.
//!
//! ## Key Types
//!
//! - [`AttestationClient`] - create / upgrade / verify / describe
//! - [`Receipt`] - Opaque receipt blob
//! - [`MockAttestationClient`] - Deterministic, offline, locally verifiable
//! - [`HelperClient`] - Drives an external calendar helper program

pub mod error;
pub mod helper;
pub mod mock;
pub mod receipt;
pub mod traits;

pub use error::{AttestationError, Result};
pub use helper::{HelperClient, DEFAULT_HELPER_TIMEOUT};
pub use mock::{MockAttestationClient, MockReceipt, DEFAULT_MOCK_SEED};
pub use receipt::{receipt_filename, Receipt, RECEIPT_EXTENSION};
pub use traits::{bounded, AttestationClient};
