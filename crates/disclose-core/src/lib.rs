//! # Disclose Core
//!
//! Pure primitives for disclose: canonical documents, SHA-256 digests and
//! bundle roots.
//!
//! This crate contains no I/O beyond `std::io::Read` sources, no storage,
//! no networking.
//!
//! ## Key Types
//!
//! - [`Value`] - Tagged document value; mappings are order-independent
//! - [`Sha256Digest`] - 32-byte digest, hex on the wire
//! - [`DraftDocument`] / [`HashableView`] - Editable document and its hashed projection
//! - [`HashesArtifact`] - Published `hashes.json`
//!
//! ## Data flow
//!
//! ```text
//! DraftDocument -> hashable_view -> canonicalize -> document digest --+
//! proof artifacts -> digest_reader -> proof digests -----------------+-> bundle_root
//! ```

pub mod canonical;
pub mod crypto;
pub mod document;
pub mod error;
pub mod hashes;
pub mod merkle;
pub mod value;

pub use canonical::{canonical_digest, canonical_string, canonicalize, canonicalize_serialize};
pub use crypto::{digest_reader, digest_reader_exact, Sha256Digest, SourceDigest};
pub use document::{
    AiTool, AssistanceGlobal, AssistanceGrade, AssistanceInfo, AssistanceStage, DraftDocument,
    GitProof, HashableView, OpenTimestampsInfo, ProofInfo, ProofItem, ProofKind, ProjectInfo,
    PublicationInfo, TemplateRef, TimestampInfo, TimestampStatus, MANIFEST_VERSION,
};
pub use error::{CanonicalizationError, CoreError, Result};
pub use hashes::{build_hashes, recompute_root, HashesArtifact, ProofHashEntry, ALGO};
pub use merkle::{bundle_root, bundle_root_for_items, merkle_root};
pub use value::{Number, Value};
