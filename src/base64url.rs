//! URL-safe, unpadded base64 as used throughout the compact JWT serialization
//! (RFC 4648 §5). Every base64 touchpoint in this crate goes through here so the
//! alphabet/padding choice is a single decision.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::JwtError;

/// Encode raw bytes as base64url without padding.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode a base64url string, rejecting any character outside the alphabet.
pub fn decode(segment: &str) -> Result<Vec<u8>, JwtError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| JwtError::MalformedToken("invalid base64url segment".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_bytes() {
        let fixtures: &[&[u8]] = &[b"", b"\0", b"hello world", &[0xff, 0x00, 0x10, 0x7f]];
        for bytes in fixtures {
            let encoded = encode(bytes);
            assert_eq!(decode(&encoded).unwrap(), *bytes);
        }
    }

    #[test]
    fn encode_never_pads() {
        assert!(!encode(b"f").contains('='));
        assert!(!encode(b"fo").contains('='));
    }

    #[test]
    fn rejects_invalid_alphabet() {
        assert!(decode("not valid base64!!").is_err());
    }
}
