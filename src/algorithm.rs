//! Bidirectional wire-name ↔ internal-name translation for signing algorithms.
//!
//! The wire names (`RS256`, `HS256`, …) are the JWA names from RFC 7518. The
//! internal names are the identifiers `ProviderFactory` keys off of; they are
//! implementation-defined but stable across a process. Keeping the two separate
//! means a deployment can remap a non-standard `alg` string (see spec §8 scenario 6)
//! without touching the provider factory.

use std::collections::HashMap;

/// Internal name for RSASSA-PKCS1-v1_5 with SHA-256.
pub const RS256: &str = "rsa-sha256-uri";
/// Internal name for RSASSA-PKCS1-v1_5 with SHA-384.
pub const RS384: &str = "rsa-sha384-uri";
/// Internal name for RSASSA-PKCS1-v1_5 with SHA-512.
pub const RS512: &str = "rsa-sha512-uri";
/// Internal name for HMAC with SHA-256.
pub const HS256: &str = "hmac-sha256-uri";
/// Internal name for HMAC with SHA-384.
pub const HS384: &str = "hmac-sha384-uri";
/// Internal name for HMAC with SHA-512.
pub const HS512: &str = "hmac-sha512-uri";

/// Inbound/outbound algorithm name maps used by the validator and builder
/// respectively.
///
/// # Panics
///
/// `set_inbound`/`set_outbound` accept an empty map only if explicitly cleared via
/// `HashMap::new()`; passing a genuinely null/uninitialized map is a caller bug this
/// crate cannot represent in Rust's type system, so no runtime check is needed —
/// unlike the source this spec was distilled from, there is no way to "assign null"
/// to a `HashMap<String, String>`.
#[derive(Clone, Debug)]
pub struct AlgorithmMap {
    inbound: HashMap<String, String>,
    outbound: HashMap<String, String>,
}

impl Default for AlgorithmMap {
    fn default() -> Self {
        let pairs = [
            ("RS256", RS256),
            ("RS384", RS384),
            ("RS512", RS512),
            ("HS256", HS256),
            ("HS384", HS384),
            ("HS512", HS512),
        ];
        let mut inbound = HashMap::new();
        let mut outbound = HashMap::new();
        for (wire, internal) in pairs {
            inbound.insert(wire.to_string(), internal.to_string());
            outbound.insert(internal.to_string(), wire.to_string());
        }
        AlgorithmMap { inbound, outbound }
    }
}

impl AlgorithmMap {
    /// Translate a wire algorithm name (from a JWT header) to an internal name.
    /// Falls through to the raw name on a miss.
    pub fn to_internal<'a>(&'a self, wire_name: &'a str) -> &'a str {
        self.inbound
            .get(wire_name)
            .map(String::as_str)
            .unwrap_or(wire_name)
    }

    /// Translate an internal algorithm name to a wire name. Falls through to the
    /// raw name on a miss.
    pub fn to_wire<'a>(&'a self, internal_name: &'a str) -> &'a str {
        self.outbound
            .get(internal_name)
            .map(String::as_str)
            .unwrap_or(internal_name)
    }

    /// Replace the inbound (wire → internal) map wholesale.
    pub fn set_inbound(&mut self, map: HashMap<String, String>) {
        self.inbound = map;
    }

    /// Replace the outbound (internal → wire) map wholesale.
    ///
    /// The source this spec was distilled from had a bug here: its
    /// `OutboundAlgorithmMap` setter mistakenly assigned into the inbound map. This
    /// implementation assigns to `self.outbound`, as the name promises.
    pub fn set_outbound(&mut self, map: HashMap<String, String>) {
        self.outbound = map;
    }

    /// Register a single additional inbound mapping without replacing the rest.
    pub fn add_inbound(&mut self, wire_name: impl Into<String>, internal_name: impl Into<String>) {
        self.inbound.insert(wire_name.into(), internal_name.into());
    }

    /// Register a single additional outbound mapping without replacing the rest.
    pub fn add_outbound(&mut self, internal_name: impl Into<String>, wire_name: impl Into<String>) {
        self.outbound.insert(internal_name.into(), wire_name.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_sha2_family() {
        let map = AlgorithmMap::default();
        assert_eq!(map.to_internal("RS256"), RS256);
        assert_eq!(map.to_internal("HS256"), HS256);
        assert_eq!(map.to_internal("RS384"), RS384);
        assert_eq!(map.to_internal("RS512"), RS512);
        assert_eq!(map.to_internal("HS384"), HS384);
        assert_eq!(map.to_internal("HS512"), HS512);
        assert_eq!(map.to_wire(HS256), "HS256");
    }

    #[test]
    fn misses_fall_through_to_raw_name() {
        let map = AlgorithmMap::default();
        assert_eq!(map.to_internal("foo"), "foo");
        assert_eq!(map.to_wire("bar"), "bar");
    }

    #[test]
    fn remapping_scenario() {
        // Spec §8 scenario 6: register outbound HS256 -> "foo", a default-inbound
        // validator then fails to resolve "foo", but adding the inbound mapping
        // fixes it.
        let mut map = AlgorithmMap::default();
        map.add_outbound(HS256, "foo");
        assert_eq!(map.to_wire(HS256), "foo");
        assert_eq!(map.to_internal("foo"), "foo"); // unknown until registered
        map.add_inbound("foo", HS256);
        assert_eq!(map.to_internal("foo"), HS256);
    }

    #[test]
    fn set_outbound_does_not_touch_inbound() {
        let mut map = AlgorithmMap::default();
        let before = map.to_internal("RS256").to_string();
        map.set_outbound(HashMap::new());
        assert_eq!(map.to_internal("RS256"), before);
        assert_eq!(map.to_wire(RS256), RS256); // outbound now empty, falls through
    }
}
