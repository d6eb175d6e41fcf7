//! # Disclose Testkit
//!
//! Testing utilities for Disclose.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known bundle roots for cross-implementation verification
//! - **Generators**: Proptest strategies for digests, proofs and documents
//! - **Fixtures**: Sample documents, proof directories and a scripted attestation client
//!
//! ## Golden Vectors
//!
//! ```rust
//! use disclose_testkit::vectors::{all_vectors, compute_root};
//!
//! for vector in all_vectors() {
//!     assert_eq!(compute_root(&vector).to_hex(), vector.expected_root);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use disclose_testkit::generators::BundleParams;
//!
//! proptest! {
//!     #[test]
//!     fn root_is_deterministic(params: BundleParams) {
//!         prop_assert_eq!(params.root(), params.root());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use disclose_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! fixture.write_proof("notes.txt", b"first draft");
//! let draft = fixture.draft_with_files(&["notes.txt"]);
//! assert_eq!(draft.proof.items.len(), 1);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{sample_draft, Scripted, ScriptedClient, TestFixture};
pub use generators::BundleParams;
pub use vectors::{all_vectors, compute_root, verify_all_vectors, BundleVector};
