//! Typed view over the JOSE header JSON object (spec §3/§4.2).
//!
//! Unknown members are preserved for round-trip: this wraps a `serde_json::Map`
//! rather than a fixed struct, because the spec requires the header's serialized
//! bytes used during verification to be exactly those originally received (P6) —
//! re-serializing through a struct with `#[serde(flatten)]` extras risks reordering
//! keys, so recognized members are read via accessors instead of being pulled out.

use serde_json::{Map, Value};

use crate::error::JwtError;
use crate::key::KeyHints;

/// A JOSE header. Recognized members are exposed as accessors; everything else
/// (including unrecognized members) stays in the backing map untouched.
#[derive(Clone, Debug)]
pub struct Header(Map<String, Value>);

impl Header {
    /// Build a header for a signed token under `wire_alg`, with `typ = "JWT"`.
    pub fn signed(wire_alg: &str, kid: Option<&str>) -> Self {
        let mut map = Map::new();
        map.insert("alg".into(), Value::String(wire_alg.to_string()));
        map.insert("typ".into(), Value::String("JWT".into()));
        if let Some(kid) = kid {
            map.insert("kid".into(), Value::String(kid.to_string()));
        }
        Header(map)
    }

    /// Build a header for an unsigned token (`alg: "none"`).
    pub fn unsigned() -> Self {
        Self::signed("none", None)
    }

    pub(crate) fn from_map(map: Map<String, Value>) -> Self {
        Header(map)
    }

    pub(crate) fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub(crate) fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// The `alg` member, required for signed tokens, `"none"` for unsigned ones.
    pub fn alg(&self) -> Result<&str, JwtError> {
        self.0
            .get("alg")
            .and_then(Value::as_str)
            .ok_or_else(|| JwtError::MalformedToken("header missing alg".into()))
    }

    pub fn typ(&self) -> Option<&str> {
        self.0.get("typ").and_then(Value::as_str)
    }

    pub fn kid(&self) -> Option<&str> {
        self.0.get("kid").and_then(Value::as_str)
    }

    pub fn x5t(&self) -> Option<&str> {
        self.0.get("x5t").and_then(Value::as_str)
    }

    #[allow(non_snake_case)]
    pub fn x5t_S256(&self) -> Option<&str> {
        self.0.get("x5t#S256").and_then(Value::as_str)
    }

    pub fn jku(&self) -> Option<&str> {
        self.0.get("jku").and_then(Value::as_str)
    }

    pub fn x5u(&self) -> Option<&str> {
        self.0.get("x5u").and_then(Value::as_str)
    }

    /// Extract the key-identifier hints this header carries, for candidate-key
    /// matching (spec §4.7).
    pub fn key_hints(&self) -> KeyHints {
        KeyHints {
            kid: self.kid().map(str::to_string),
            x5t: self.x5t().map(str::to_string),
            x5t_s256: self.x5t_S256().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_header_carries_alg_and_typ() {
        let header = Header::signed("HS256", Some("v1"));
        assert_eq!(header.alg().unwrap(), "HS256");
        assert_eq!(header.typ(), Some("JWT"));
        assert_eq!(header.kid(), Some("v1"));
    }

    #[test]
    fn unsigned_header_uses_none_alg() {
        assert_eq!(Header::unsigned().alg().unwrap(), "none");
    }

    #[test]
    fn unknown_members_are_preserved() {
        let mut map = Map::new();
        map.insert("alg".into(), Value::String("HS256".into()));
        map.insert("custom".into(), Value::String("kept".into()));
        let header = Header::from_map(map);
        assert_eq!(header.as_map().get("custom").and_then(Value::as_str), Some("kept"));
    }
}
