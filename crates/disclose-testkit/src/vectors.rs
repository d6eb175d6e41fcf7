//! Golden bundle vectors.
//!
//! Digests are 32 repetitions of one byte so the vectors can be rebuilt
//! by hand in any language.

use disclose_core::{bundle_root, Sha256Digest};

/// A golden bundle-root vector.
#[derive(Debug, Clone)]
pub struct BundleVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Fill byte of the document digest.
    pub document: u8,
    /// Fill bytes of the proof digests, in the order they are supplied.
    pub proofs: &'static [u8],
    /// Expected bundle root (hex).
    pub expected_root: &'static str,
}

/// Get all golden vectors.
pub fn all_vectors() -> Vec<BundleVector> {
    vec![
        BundleVector {
            name: "reference: three proofs",
            document: 0xaa,
            proofs: &[0xbb, 0xcc, 0xdd],
            expected_root: "81952b5c47f0703b5f2543a6dde2be50c5271e327c438e85c70874adf5b10e12",
        },
        BundleVector {
            name: "reference, proofs supplied out of order",
            document: 0xaa,
            proofs: &[0xdd, 0xbb, 0xcc],
            expected_root: "81952b5c47f0703b5f2543a6dde2be50c5271e327c438e85c70874adf5b10e12",
        },
        BundleVector {
            name: "document only",
            document: 0xaa,
            proofs: &[],
            expected_root: "693e5f0f347a5d70acbb7baaab9beb988301b3e9588e32c73d7dcdfb7b2c4604",
        },
        BundleVector {
            name: "one proof",
            document: 0xaa,
            proofs: &[0xbb],
            expected_root: "e2d80f78d79027556d6619a1400605abbdca6bb6eb24e0831e33ecd5466fa5f6",
        },
        BundleVector {
            name: "two proofs, odd leaf count",
            document: 0xaa,
            proofs: &[0xbb, 0xcc],
            expected_root: "b3a419030971470a7bb3b165e163a11973b3e81aa1dfb29c0769725346a76fbf",
        },
        BundleVector {
            name: "duplicate proofs",
            document: 0xaa,
            proofs: &[0xbb, 0xbb],
            expected_root: "8b2f237b724af94c5714039da5f54ecd96f37f2e89f76b698417e03fa3968f52",
        },
        BundleVector {
            name: "document stays first even when it sorts last",
            document: 0xff,
            proofs: &[0x01],
            expected_root: "a7a649638f6253f3ec7aa25336fd9a4c4ea64e8000931434a27373a21c50fac3",
        },
        BundleVector {
            name: "five proofs, three levels",
            document: 0x01,
            proofs: &[0x02, 0x03, 0x04, 0x05, 0x06],
            expected_root: "2250f582531555230de0a05c445f75095146f0139d2a0044c2d948573a9c29ea",
        },
    ]
}

fn filled(byte: u8) -> Sha256Digest {
    Sha256Digest::from_bytes([byte; 32])
}

/// Compute the bundle root described by a vector.
pub fn compute_root(vector: &BundleVector) -> Sha256Digest {
    let proofs: Vec<Sha256Digest> = vector.proofs.iter().copied().map(filled).collect();
    bundle_root(&filled(vector.document), &proofs)
}

/// Verify all golden vectors produce their expected root.
pub fn verify_all_vectors() -> Result<(), String> {
    for vector in all_vectors() {
        let actual = compute_root(&vector).to_hex();
        if actual != vector.expected_root {
            return Err(format!(
                "vector '{}' mismatch:\n  expected: {}\n  actual:   {}",
                vector.name, vector.expected_root, actual
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_match() {
        verify_all_vectors().unwrap();
    }

    #[test]
    fn test_vector_names_unique() {
        let vectors = all_vectors();
        let mut names: Vec<_> = vectors.iter().map(|v| v.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), vectors.len());
    }
}
