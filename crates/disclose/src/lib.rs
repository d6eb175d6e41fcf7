//! # Disclose
//!
//! Integrity engine for disclosure documents: a content-addressed
//! fingerprint of a document and its proof artifacts, optionally anchored
//! with an external timestamping service.
//!
//! ## Overview
//!
//! - **Hashing**: canonical document digest plus per-artifact SHA-256
//! - **Bundle root**: one Merkle root over the document and its proofs
//! - **Receipts**: a lifecycle driving stamp / upgrade / verify over the root
//!
//! ## Usage
//!
//! ```rust,no_run
//! use disclose::{DiscloseConfig, Engine};
//! use disclose::attest::MockAttestationClient;
//! use std::path::Path;
//!
//! async fn example() -> disclose::Result<()> {
//!     let engine = Engine::new(MockAttestationClient::default(), DiscloseConfig::default());
//!
//!     let mut draft = disclose::files::read_draft(Path::new("disclosure.json")).await?;
//!     let hashes = engine.seal(&mut draft, Path::new(".")).await?;
//!
//!     let mut lifecycle = engine.lifecycle();
//!     lifecycle.stamp(&hashes.bundle_root_sha256).await?;
//!     lifecycle.apply_to(&mut draft);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `disclose::core` - Canonicalization, digests, Merkle, document model
//! - `disclose::attest` - Attestation clients and receipts

pub mod config;
pub mod engine;
pub mod error;
pub mod files;
pub mod hasher;
pub mod lifecycle;
pub mod pipeline;

// Re-export component crates
pub use disclose_attest as attest;
pub use disclose_core as core;

pub use config::DiscloseConfig;
pub use engine::Engine;
pub use error::{DiscloseError, Result};
pub use hasher::{digest, digest_file, HashStrategy};
pub use lifecycle::{LifecycleSnapshot, ReceiptLifecycle, ReceiptStatus, VerifyOutcome};
pub use pipeline::{HashReport, Pipeline};

// Commonly used types
pub use disclose_attest::{AttestationClient, AttestationError, Receipt};
pub use disclose_core::{
    build_hashes, bundle_root, recompute_root, CoreError, DraftDocument, HashesArtifact,
    ProofItem, Sha256Digest,
};
