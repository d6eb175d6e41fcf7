//! SHA-256 digests.
//!
//! The digest algorithm is fixed by [`crate::hashes::ALGO`]; changing it
//! requires a new algorithm tag on every emitted hashes artifact.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{ErrorKind, Read};

use crate::error::{CoreError, Result};

/// Chunk size used when streaming a reader through the hasher.
const READ_CHUNK: usize = 64 * 1024;

/// A 32-byte SHA-256 digest.
///
/// Ordering is byte-lexicographic, which is the same order as comparing
/// the lowercase hex encodings.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sha256Digest(pub [u8; 32]);

impl Sha256Digest {
    /// Compute the SHA-256 digest of a byte buffer.
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Compute the digest of `left || right`.
    pub fn hash_pair(left: &Sha256Digest, right: &Sha256Digest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(left.0);
        hasher.update(right.0);
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidDigest(e.to_string()))?;
        Self::try_from(bytes.as_slice())
            .map_err(|_| CoreError::InvalidDigest(format!("expected 32 bytes, got {}", bytes.len())))
    }
}

impl fmt::Debug for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHA256({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Sha256Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Sha256Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Sha256Digest {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> std::result::Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

impl std::str::FromStr for Sha256Digest {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Sha256Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Digest and length of a fully consumed byte source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDigest {
    pub digest: Sha256Digest,
    pub size_bytes: u64,
}

/// Stream a reader to EOF and digest everything it yields.
///
/// Any I/O error other than an interrupted read is a `ReadFailure`; the
/// partially fed hasher is discarded.
pub fn digest_reader<R: Read>(mut reader: R) -> Result<SourceDigest> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_CHUNK];
    let mut size_bytes = 0u64;
    loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CoreError::ReadFailure(e.to_string())),
        };
        hasher.update(&buf[..read]);
        size_bytes += read as u64;
    }
    Ok(SourceDigest {
        digest: Sha256Digest(hasher.finalize().into()),
        size_bytes,
    })
}

/// Like [`digest_reader`], but fails unless exactly `expected_len` bytes were read.
///
/// Used when the caller knows the source length up front (file metadata) so a
/// stream that ends early, or grows while being read, never yields a digest.
pub fn digest_reader_exact<R: Read>(reader: R, expected_len: u64) -> Result<SourceDigest> {
    let source = digest_reader(reader)?;
    if source.size_bytes != expected_len {
        return Err(CoreError::ReadFailure(format!(
            "truncated source: expected {} bytes, read {}",
            expected_len, source.size_bytes
        )));
    }
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_sha256_known_value() {
        // FIPS 180-2 "abc"
        assert_eq!(
            Sha256Digest::hash(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_pair_is_hash_of_concatenation() {
        let a = Sha256Digest::from_bytes([0x11; 32]);
        let b = Sha256Digest::from_bytes([0x22; 32]);
        let mut joined = Vec::new();
        joined.extend_from_slice(a.as_bytes());
        joined.extend_from_slice(b.as_bytes());
        assert_eq!(Sha256Digest::hash_pair(&a, &b), Sha256Digest::hash(&joined));
    }

    #[test]
    fn test_hex_roundtrip() {
        let d = Sha256Digest::hash(b"disclose");
        assert_eq!(Sha256Digest::from_hex(&d.to_hex()).unwrap(), d);
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        assert!(matches!(
            Sha256Digest::from_hex("abcd"),
            Err(CoreError::InvalidDigest(_))
        ));
        assert!(Sha256Digest::from_hex("zz").is_err());
    }

    #[test]
    fn test_ordering_matches_hex_ordering() {
        let a = Sha256Digest::from_bytes([0x0f; 32]);
        let b = Sha256Digest::from_bytes([0xa0; 32]);
        assert!(a < b);
        assert!(a.to_hex() < b.to_hex());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let d = Sha256Digest::from_bytes([0xab; 32]);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: Sha256Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_digest_reader_matches_buffer_hash() {
        let data = vec![7u8; READ_CHUNK * 3 + 17];
        let source = digest_reader(data.as_slice()).unwrap();
        assert_eq!(source.digest, Sha256Digest::hash(&data));
        assert_eq!(source.size_bytes, data.len() as u64);
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(io::ErrorKind::Other, "disk gone"));
            }
            self.served = true;
            buf[0] = 1;
            Ok(1)
        }
    }

    #[test]
    fn test_digest_reader_failure_yields_no_digest() {
        let err = digest_reader(FailingReader { served: false }).unwrap_err();
        assert!(matches!(err, CoreError::ReadFailure(_)));
    }

    #[test]
    fn test_digest_reader_exact_detects_truncation() {
        let data = b"short";
        let err = digest_reader_exact(&data[..], 10).unwrap_err();
        assert!(matches!(err, CoreError::ReadFailure(_)));
        assert!(digest_reader_exact(&data[..], 5).is_ok());
    }
}
