//! Compact serialization: the three-segment `header.payload.signature` wire form
//! (spec §4.2), plus the pure structural check `can_read` (spec §4.6).
//!
//! Canonicalization preserves caller-chosen key order: `Header`/`Payload` wrap a
//! `serde_json::Map` built with the `preserve_order` feature, so `serde_json::to_vec`
//! never re-sorts keys — this is what lets an externally-signed token's bytes match
//! what this crate reproduces on decode→encode round-trip (spec P2).

use crate::base64url;
use crate::error::JwtError;
use crate::header::Header;
use crate::jwt::Jwt;
use crate::payload::Payload;

/// Default cap on raw token size, applied before any parsing (spec §6).
pub const DEFAULT_MAX_TOKEN_SIZE_BYTES: usize = 262_144;

/// `can_read(s)`: a pure structural check with no allocation of parsed state.
///
/// True iff `len(s) * 2 <= max_token_size_bytes` and `s` matches
/// `^[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*$`.
///
/// This is a hand-written byte scan rather than a regex: the grammar (three runs of
/// one alphabet, separated by exactly two literal dots, the last run possibly
/// empty) is simple enough that a scanner is both clearer and avoids a dependency
/// the teacher crate never needed.
pub fn can_read(s: &str, max_token_size_bytes: usize) -> bool {
    if s.len().saturating_mul(2) > max_token_size_bytes {
        return false;
    }
    let bytes = s.as_bytes();
    let mut segment_lens = [0usize; 3];
    let mut segment = 0;
    for &b in bytes {
        if b == b'.' {
            segment += 1;
            if segment > 2 {
                return false;
            }
            continue;
        }
        if !is_base64url_byte(b) {
            return false;
        }
        segment_lens[segment] += 1;
    }
    segment == 2 && segment_lens[0] > 0 && segment_lens[1] > 0
}

fn is_base64url_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Split a compact string into its three raw segments, without decoding them.
fn split_segments(raw: &str) -> Result<(&str, &str, &str), JwtError> {
    let mut parts = raw.split('.');
    let (Some(h), Some(p), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(JwtError::MalformedToken(
            "expected exactly three dot-separated segments".into(),
        ));
    };
    Ok((h, p, s))
}

/// Decode a compact-serialized JWT into its structural parts, without validating
/// anything. JSON/base64 failures are reported as `MalformedToken`.
pub fn decode(raw: &str, max_token_size_bytes: usize) -> Result<Jwt, JwtError> {
    if raw.len() > max_token_size_bytes {
        return Err(JwtError::TokenTooLarge {
            actual: raw.len(),
            limit: max_token_size_bytes,
        });
    }
    if !can_read(raw, max_token_size_bytes) {
        return Err(JwtError::MalformedToken(
            "token does not match the compact-serialization grammar".into(),
        ));
    }

    let (header_b64, payload_b64, signature_b64) = split_segments(raw)?;

    let header_bytes = base64url::decode(header_b64)?;
    let header_value: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&header_bytes)?;
    let header = Header::from_map(header_value);

    let payload_bytes = base64url::decode(payload_b64)?;
    let payload_value: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&payload_bytes)?;
    let payload = Payload::from_map(payload_value);

    // A non-empty-but-zero-decoded signature segment is malformed, not "unsigned":
    // distinguish "segment was empty" from "segment decoded to zero bytes" rather
    // than collapsing both to an empty Vec.
    let signature = if signature_b64.is_empty() {
        Vec::new()
    } else {
        let decoded = base64url::decode(signature_b64)?;
        if decoded.is_empty() {
            return Err(JwtError::MalformedToken(
                "non-empty signature segment decoded to zero bytes".into(),
            ));
        }
        decoded
    };

    let signing_input = format!("{header_b64}.{payload_b64}").into_bytes();

    Ok(Jwt::new(header, payload, signing_input, signature, Some(raw.to_string())))
}

/// Assemble `header_b64 "." payload_b64` and return it alongside the full compact
/// string once a signature is appended. Used by both the builder (to compute the
/// signing input before signing) and `write_token` (to re-serialize an already
/// signed `Jwt`).
pub fn signing_input(header: &Header, payload: &Payload) -> Result<Vec<u8>, JwtError> {
    let header_json = serde_json::to_vec(header.as_map())?;
    let payload_json = serde_json::to_vec(payload.as_map())?;
    let header_b64 = base64url::encode(&header_json);
    let payload_b64 = base64url::encode(&payload_json);
    Ok(format!("{header_b64}.{payload_b64}").into_bytes())
}

/// Assemble the full compact string from a precomputed signing input and
/// signature bytes.
pub fn assemble(signing_input: &[u8], signature: &[u8]) -> Result<String, JwtError> {
    let signing_input = std::str::from_utf8(signing_input)
        .map_err(|_| JwtError::MalformedToken("signing input was not ASCII".into()))?;
    let signature_b64 = base64url::encode(signature);
    Ok(format!("{signing_input}.{signature_b64}"))
}
