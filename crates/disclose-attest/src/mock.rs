//! Deterministic local attestation client.
//!
//! Receipts are canonical CBOR maps signed with an Ed25519 key derived from
//! a fixed seed, so the same seed and digest always give the same bytes and
//! any holder of the seed can verify offline.
//!
//! Receipt layout (integer keys, sorted, definite lengths):
//!
//! ```text
//! { 0: version, 1: digest (32 bytes), 2: signer (32 bytes),
//!   3: [ { 0: calendar, 1: state, 2: signature (64 bytes) }, ... ] }
//! ```

use async_trait::async_trait;
use ciborium::value::Value;
use disclose_core::Sha256Digest;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use tracing::debug;

use crate::error::{AttestationError, Result};
use crate::receipt::Receipt;
use crate::traits::AttestationClient;

/// Receipt format version.
pub const MOCK_RECEIPT_VERSION: u64 = 1;

/// Domain separator for attestation signatures.
pub const ATTEST_DOMAIN: &[u8] = b"disclose/mock-attest/v1";

/// Calendar name used when none are configured.
pub const DEFAULT_MOCK_CALENDAR: &str = "mock://calendar.local";

/// Seed used in deterministic mode.
pub const DEFAULT_MOCK_SEED: [u8; 32] = [0x5e; 32];

mod keys {
    pub const VERSION: u64 = 0;
    pub const DIGEST: u64 = 1;
    pub const SIGNER: u64 = 2;
    pub const ATTESTATIONS: u64 = 3;

    pub const CALENDAR: u64 = 0;
    pub const STATE: u64 = 1;
    pub const SIGNATURE: u64 = 2;
}

/// Progress of a single attestation inside a mock receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationState {
    Pending,
    Complete,
}

impl AttestationState {
    fn to_u64(self) -> u64 {
        match self {
            AttestationState::Pending => 0,
            AttestationState::Complete => 1,
        }
    }

    fn from_u64(n: u64) -> Option<Self> {
        match n {
            0 => Some(AttestationState::Pending),
            1 => Some(AttestationState::Complete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttestationState::Pending => "pending",
            AttestationState::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockAttestation {
    pub calendar: String,
    pub state: AttestationState,
    pub signature: [u8; 64],
}

/// Decoded form of a mock receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockReceipt {
    pub version: u64,
    pub digest: Sha256Digest,
    pub signer: [u8; 32],
    pub attestations: Vec<MockAttestation>,
}

impl MockReceipt {
    /// Encode to canonical CBOR.
    pub fn encode(&self) -> Vec<u8> {
        let attestations = self
            .attestations
            .iter()
            .map(|a| {
                Value::Map(vec![
                    (int(keys::CALENDAR), Value::Text(a.calendar.clone())),
                    (int(keys::STATE), int(a.state.to_u64())),
                    (int(keys::SIGNATURE), Value::Bytes(a.signature.to_vec())),
                ])
            })
            .collect();

        let value = Value::Map(vec![
            (int(keys::VERSION), int(self.version)),
            (int(keys::DIGEST), Value::Bytes(self.digest.0.to_vec())),
            (int(keys::SIGNER), Value::Bytes(self.signer.to_vec())),
            (int(keys::ATTESTATIONS), Value::Array(attestations)),
        ]);

        let mut buf = Vec::new();
        encode_value_to(&mut buf, &value);
        buf
    }

    /// Decode from bytes, rejecting anything that is not canonical.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let value: Value = ciborium::from_reader(bytes)
            .map_err(|e| AttestationError::MalformedReceipt(e.to_string()))?;
        let receipt = Self::from_cbor_value(&value)?;
        if receipt.encode() != bytes {
            return Err(AttestationError::MalformedReceipt(
                "non-canonical encoding".into(),
            ));
        }
        Ok(receipt)
    }

    fn from_cbor_value(value: &Value) -> Result<Self> {
        let map = as_map(value, "receipt")?;

        let version = get_u64(map, keys::VERSION, "version")?;
        if version != MOCK_RECEIPT_VERSION {
            return Err(AttestationError::MalformedReceipt(format!(
                "unsupported version: {version}"
            )));
        }
        let digest = Sha256Digest::from_bytes(get_array::<32>(map, keys::DIGEST, "digest")?);
        let signer = get_array::<32>(map, keys::SIGNER, "signer")?;

        let attestations = match get(map, keys::ATTESTATIONS) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    let m = as_map(item, "attestation")?;
                    let calendar = match get(m, keys::CALENDAR) {
                        Some(Value::Text(s)) => s.clone(),
                        _ => return Err(malformed("calendar")),
                    };
                    let state = AttestationState::from_u64(get_u64(m, keys::STATE, "state")?)
                        .ok_or_else(|| malformed("state"))?;
                    let signature = get_array::<64>(m, keys::SIGNATURE, "signature")?;
                    Ok(MockAttestation {
                        calendar,
                        state,
                        signature,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            _ => return Err(malformed("attestations")),
        };

        Ok(Self {
            version,
            digest,
            signer,
            attestations,
        })
    }
}

/// The message each calendar signs: `DOMAIN || digest || calendar || state`.
fn attestation_message(digest: &Sha256Digest, calendar: &str, state: AttestationState) -> Vec<u8> {
    let mut msg = Vec::with_capacity(ATTEST_DOMAIN.len() + 32 + calendar.len() + 1);
    msg.extend_from_slice(ATTEST_DOMAIN);
    msg.extend_from_slice(digest.as_bytes());
    msg.extend_from_slice(calendar.as_bytes());
    msg.push(state.to_u64() as u8);
    msg
}

/// A deterministic, offline [`AttestationClient`].
///
/// `upgrade` is a successful no-op: it returns the receipt unchanged.
#[derive(Clone)]
pub struct MockAttestationClient {
    signing_key: SigningKey,
    calendars: Vec<String>,
}

impl MockAttestationClient {
    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
            calendars: vec![DEFAULT_MOCK_CALENDAR.to_string()],
        }
    }

    /// Replace the calendar list. An empty list keeps the default calendar.
    pub fn with_calendars(mut self, calendars: Vec<String>) -> Self {
        if !calendars.is_empty() {
            self.calendars = calendars;
        }
        self
    }

    /// Public key receipts are signed with.
    pub fn signer(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    fn sign(&self, digest: &Sha256Digest, calendar: &str, state: AttestationState) -> [u8; 64] {
        self.signing_key
            .sign(&attestation_message(digest, calendar, state))
            .to_bytes()
    }

    fn signatures_valid(&self, receipt: &MockReceipt) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(&receipt.signer) else {
            return false;
        };
        receipt.attestations.iter().all(|a| {
            let msg = attestation_message(&receipt.digest, &a.calendar, a.state);
            key.verify(&msg, &Signature::from_bytes(&a.signature)).is_ok()
        })
    }
}

impl Default for MockAttestationClient {
    fn default() -> Self {
        Self::from_seed(&DEFAULT_MOCK_SEED)
    }
}

impl std::fmt::Debug for MockAttestationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockAttestationClient({}...)", &hex::encode(self.signer())[..8])
    }
}

#[async_trait]
impl AttestationClient for MockAttestationClient {
    async fn create(&self, digest: &Sha256Digest) -> Result<Receipt> {
        let attestations = self
            .calendars
            .iter()
            .map(|calendar| MockAttestation {
                calendar: calendar.clone(),
                state: AttestationState::Pending,
                signature: self.sign(digest, calendar, AttestationState::Pending),
            })
            .collect();
        let receipt = MockReceipt {
            version: MOCK_RECEIPT_VERSION,
            digest: *digest,
            signer: self.signer(),
            attestations,
        };
        debug!(digest = %digest, calendars = self.calendars.len(), "mock receipt created");
        Ok(Receipt::from(receipt.encode()))
    }

    async fn upgrade(&self, receipt: &Receipt) -> Result<Receipt> {
        MockReceipt::decode(receipt.as_bytes())?;
        Ok(receipt.clone())
    }

    async fn verify(&self, receipt: &Receipt, digest: &Sha256Digest) -> Result<bool> {
        let decoded = MockReceipt::decode(receipt.as_bytes())?;
        if decoded.digest != *digest || decoded.signer != self.signer() {
            return Ok(false);
        }
        Ok(!decoded.attestations.is_empty() && self.signatures_valid(&decoded))
    }

    async fn describe(&self, receipt: &Receipt) -> Result<String> {
        let decoded = MockReceipt::decode(receipt.as_bytes())?;
        let info = serde_json::json!({
            "version": decoded.version,
            "digest": decoded.digest.to_hex(),
            "signer": hex::encode(decoded.signer),
            "attestations": decoded
                .attestations
                .iter()
                .map(|a| serde_json::json!({
                    "calendar": a.calendar,
                    "status": a.state.as_str(),
                }))
                .collect::<Vec<_>>(),
        });
        Ok(info.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Canonical CBOR
// ─────────────────────────────────────────────────────────────────────────────

fn int(n: u64) -> Value {
    Value::Integer(n.into())
}

fn malformed(field: &str) -> AttestationError {
    AttestationError::MalformedReceipt(format!("invalid {field}"))
}

fn as_map<'a>(value: &'a Value, what: &str) -> Result<&'a [(Value, Value)]> {
    match value {
        Value::Map(m) => Ok(m),
        _ => Err(AttestationError::MalformedReceipt(format!("expected {what} map"))),
    }
}

fn get(map: &[(Value, Value)], key: u64) -> Option<&Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == key as i128))
        .map(|(_, v)| v)
}

fn get_u64(map: &[(Value, Value)], key: u64, field: &str) -> Result<u64> {
    match get(map, key) {
        Some(Value::Integer(i)) => u64::try_from(i128::from(*i)).map_err(|_| malformed(field)),
        _ => Err(malformed(field)),
    }
}

fn get_array<const N: usize>(map: &[(Value, Value)], key: u64, field: &str) -> Result<[u8; N]> {
    match get(map, key) {
        Some(Value::Bytes(b)) => b.as_slice().try_into().map_err(|_| malformed(field)),
        _ => Err(malformed(field)),
    }
}

/// Recursively encode the subset of CBOR used by mock receipts.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            if n >= 0 {
                encode_uint(buf, 0, n as u64);
            } else {
                encode_uint(buf, 1, (-1 - n) as u64);
            }
        }
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(items) => {
            encode_uint(buf, 4, items.len() as u64);
            for item in items {
                encode_value_to(buf, item);
            }
        }
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        // only the types above are ever built by MockReceipt::encode
        _ => buf.push(0xf6),
    }
}

/// Encode an unsigned integer with the given major type, smallest form.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Keys are sorted by their encoded bytes.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> MockAttestationClient {
        MockAttestationClient::from_seed(&[0x42; 32])
    }

    #[tokio::test]
    async fn test_create_is_deterministic() {
        let digest = Sha256Digest::hash(b"root");
        let a = client().create(&digest).await.unwrap();
        let b = client().create(&digest).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_verify_roundtrip() {
        let c = client();
        let digest = Sha256Digest::hash(b"root");
        let receipt = c.create(&digest).await.unwrap();
        assert!(c.verify(&receipt, &digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_other_digest_is_false() {
        let c = client();
        let receipt = c.create(&Sha256Digest::hash(b"root")).await.unwrap();
        assert!(!c.verify(&receipt, &Sha256Digest::hash(b"other")).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_with_other_seed_is_false() {
        let digest = Sha256Digest::hash(b"root");
        let receipt = client().create(&digest).await.unwrap();
        let stranger = MockAttestationClient::from_seed(&[0x01; 32]);
        assert!(!stranger.verify(&receipt, &digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_tampered_signature_fails() {
        let c = client();
        let digest = Sha256Digest::hash(b"root");
        let receipt = c.create(&digest).await.unwrap();
        let mut decoded = MockReceipt::decode(receipt.as_bytes()).unwrap();
        decoded.attestations[0].signature[0] ^= 0xff;
        let tampered = Receipt::from(decoded.encode());
        assert!(!c.verify(&tampered, &digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_upgrade_is_noop() {
        let c = client();
        let digest = Sha256Digest::hash(b"root");
        let receipt = c.create(&digest).await.unwrap();
        let upgraded = c.upgrade(&receipt).await.unwrap();
        assert_eq!(upgraded, receipt);
        assert!(c.verify(&upgraded, &digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_garbage_is_malformed() {
        let c = client();
        let garbage = Receipt::from(vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(
            c.verify(&garbage, &Sha256Digest::hash(b"x")).await,
            Err(AttestationError::MalformedReceipt(_))
        ));
        assert!(c.upgrade(&garbage).await.is_err());
    }

    #[tokio::test]
    async fn test_trailing_bytes_rejected() {
        let c = client();
        let digest = Sha256Digest::hash(b"root");
        let mut bytes = c.create(&digest).await.unwrap().as_bytes().to_vec();
        bytes.push(0x00);
        assert!(MockReceipt::decode(&bytes).is_err());
    }

    #[tokio::test]
    async fn test_describe_lists_calendars() {
        let c = client().with_calendars(vec!["a".into(), "b".into()]);
        let receipt = c.create(&Sha256Digest::hash(b"root")).await.unwrap();
        let info: serde_json::Value =
            serde_json::from_str(&c.describe(&receipt).await.unwrap()).unwrap();
        assert_eq!(info["attestations"].as_array().unwrap().len(), 2);
        assert_eq!(info["attestations"][0]["status"], "pending");
    }

    #[test]
    fn test_encoding_is_canonical() {
        let receipt = MockReceipt {
            version: 1,
            digest: Sha256Digest::from_bytes([0; 32]),
            signer: [1; 32],
            attestations: vec![],
        };
        let bytes = receipt.encode();
        // map(4), key 0, uint 1
        assert_eq!(&bytes[..3], &[0xa4, 0x00, 0x01]);
        assert_eq!(MockReceipt::decode(&bytes).unwrap(), receipt);
    }

    mod properties {
        use crate::{AttestationClient, MockAttestationClient, MockReceipt, Receipt};
        use disclose_core::Sha256Digest;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
                let _ = MockReceipt::decode(&bytes);
            }

            #[test]
            fn flipped_byte_is_rejected_or_unverified(seed in any::<[u8; 32]>(), digest in any::<[u8; 32]>(), index in any::<prop::sample::Index>()) {
                let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
                let client = MockAttestationClient::from_seed(&seed);
                let digest = Sha256Digest::from_bytes(digest);
                let receipt = runtime.block_on(client.create(&digest)).unwrap();

                let mut bytes = receipt.as_bytes().to_vec();
                let i = index.index(bytes.len());
                bytes[i] ^= 0x01;
                let tampered = Receipt::from(bytes);
                let verified = runtime.block_on(client.verify(&tampered, &digest)).unwrap_or(false);
                prop_assert!(!verified);
            }
        }
    }
}
