//! Canonical JSON encoding for deterministic hashing.
//!
//! The encoding rules:
//! - Mapping keys sorted by their UTF-8 bytes
//! - Sequences keep their order
//! - No whitespace
//! - One literal form each for `null`, `true`, `false` and strings
//! - Integers in plain decimal; integral floats inside the safe integer
//!   range written as integers
//! - Other finite floats in shortest round-trip digits laid out the way
//!   ECMAScript `Number::toString` does: plain decimal for decimal exponents
//!   in `-7..21`, otherwise `d.ddde+x` / `d.ddde-x`
//!
//! Two structurally equal documents always produce identical bytes, and so
//! identical digests.

use serde::Serialize;

use crate::crypto::Sha256Digest;
use crate::error::CanonicalizationError;
use crate::value::{Number, Value};

/// Largest integer a float can hold without losing precision (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Encode a value to canonical bytes.
pub fn canonicalize(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value, &mut Vec::new())?;
    Ok(buf)
}

/// Encode a value to its canonical string form.
pub fn canonical_string(value: &Value) -> Result<String, CanonicalizationError> {
    let bytes = canonicalize(value)?;
    String::from_utf8(bytes).map_err(|e| CanonicalizationError::Serialization(e.to_string()))
}

/// Canonicalize any serializable type.
pub fn canonicalize_serialize<T: Serialize + ?Sized>(
    value: &T,
) -> Result<Vec<u8>, CanonicalizationError> {
    canonicalize(&Value::from_serialize(value)?)
}

/// SHA-256 of the canonical bytes of a value.
pub fn canonical_digest(value: &Value) -> Result<Sha256Digest, CanonicalizationError> {
    Ok(Sha256Digest::hash(&canonicalize(value)?))
}

/// Recursively encode a value. `path` tracks the location for error messages.
fn encode_value_to(
    buf: &mut Vec<u8>,
    value: &Value,
    path: &mut Vec<String>,
) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null => buf.extend_from_slice(b"null"),
        Value::Bool(true) => buf.extend_from_slice(b"true"),
        Value::Bool(false) => buf.extend_from_slice(b"false"),
        Value::Number(n) => encode_number(buf, *n, path)?,
        Value::String(s) => encode_text(buf, s)?,
        Value::Sequence(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                path.push(i.to_string());
                encode_value_to(buf, item, path)?;
                path.pop();
            }
            buf.push(b']');
        }
        Value::Mapping(entries) => {
            // BTreeMap<String, _> iterates in byte order of the keys
            buf.push(b'{');
            for (i, (key, item)) in entries.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                encode_text(buf, key)?;
                buf.push(b':');
                path.push(key.clone());
                encode_value_to(buf, item, path)?;
                path.pop();
            }
            buf.push(b'}');
        }
    }
    Ok(())
}

fn encode_number(
    buf: &mut Vec<u8>,
    n: Number,
    path: &[String],
) -> Result<(), CanonicalizationError> {
    match n {
        Number::Int(i) => buf.extend_from_slice(i.to_string().as_bytes()),
        Number::UInt(u) => buf.extend_from_slice(u.to_string().as_bytes()),
        Number::Float(f) => {
            if !f.is_finite() {
                return Err(CanonicalizationError::NonFiniteNumber(render_path(path)));
            }
            if f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER {
                // also folds -0.0 into 0
                buf.extend_from_slice((f as i64).to_string().as_bytes());
            } else {
                buf.extend_from_slice(float_text(f).as_bytes());
            }
        }
    }
    Ok(())
}

/// Shortest round-trip digits of a finite, non-zero float in ECMAScript layout.
fn float_text(f: f64) -> String {
    // `{:e}` yields the shortest round-trip digits, e.g. "1.25e-7" or "1e21"
    let sci = format!("{:e}", f.abs());
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    // position of the decimal point relative to the digit string
    let n = exponent + 1;

    let mut out = String::new();
    if f.is_sign_negative() {
        out.push('-');
    }
    if k <= n && n <= 21 {
        out.push_str(&digits);
        out.extend(std::iter::repeat('0').take((n - k) as usize));
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        out.push_str(int);
        out.push('.');
        out.push_str(frac);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take((-n) as usize));
        out.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        out.push('e');
        out.push(if n - 1 < 0 { '-' } else { '+' });
        out.push_str(&(n - 1).abs().to_string());
    }
    out
}

fn encode_text(buf: &mut Vec<u8>, s: &str) -> Result<(), CanonicalizationError> {
    serde_json::to_writer(&mut *buf, s)
        .map_err(|e| CanonicalizationError::Serialization(e.to_string()))
}

fn render_path(path: &[String]) -> String {
    if path.is_empty() {
        "$".to_string()
    } else {
        format!("$.{}", path.join("."))
    }
}
