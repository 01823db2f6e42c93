//! Signing/verification key material and the key-identifier matching rule used to
//! shortlist candidate keys during validation (spec §4.7, §9).

use openssl::bn::BigNum;
use openssl::hash::{hash, MessageDigest};

use crate::base64url;
use crate::error::JwtError;

/// A symmetric (HMAC) key. The byte content is always an owned copy — this crate
/// never stores aliased references to caller-owned key bytes.
#[derive(Clone, Debug)]
pub struct SymmetricKey {
    key_id: Option<String>,
    bytes: Vec<u8>,
}

impl SymmetricKey {
    /// Construct a symmetric key from raw bytes. Panics mirror the data-model
    /// invariant ("symmetric keys carry ≥1 byte") because an empty key is a caller
    /// bug, not a runtime condition to recover from.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        assert!(!bytes.is_empty(), "symmetric keys must carry at least one byte");
        SymmetricKey { key_id: None, bytes }
    }

    /// Attach a key identifier (used for `kid` matching).
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Owned copy of the key bytes. Cloned on every call so callers never observe
    /// an aliased buffer.
    pub fn key_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

/// RSA public-component (and, optionally, PEM private) key material.
///
/// Verification uses the JWK-style `(n, e)` public components directly, following
/// the teacher crate's approach. Signing needs a full private key; rather than
/// requiring every CRT parameter (p, q, dp, dq, qi) the spec's data model doesn't
/// name, a PEM-encoded private key is accepted for that path.
#[derive(Clone, Debug)]
pub struct RsaKeyMaterial {
    key_id: Option<String>,
    /// Base64url-encoded modulus, as found in a JWK.
    n: String,
    /// Base64url-encoded public exponent, as found in a JWK.
    e: String,
    /// PEM-encoded private key, required only for signing.
    private_pem: Option<Vec<u8>>,
}

impl RsaKeyMaterial {
    /// Construct from JWK-style public components.
    pub fn from_public_components(n: impl Into<String>, e: impl Into<String>) -> Self {
        RsaKeyMaterial {
            key_id: None,
            n: n.into(),
            e: e.into(),
            private_pem: None,
        }
    }

    /// Attach a PEM-encoded private key, enabling this material to be used for
    /// signing as well as verification.
    #[must_use]
    pub fn with_private_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.private_pem = Some(pem.into());
        self
    }

    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub(crate) fn public_key(&self) -> Result<openssl::rsa::Rsa<openssl::pkey::Public>, JwtError> {
        let n = decode_fragment(&self.n)?;
        let e = decode_fragment(&self.e)?;
        openssl::rsa::Rsa::from_public_components(n, e).map_err(Into::into)
    }

    pub(crate) fn private_key(&self) -> Result<openssl::rsa::Rsa<openssl::pkey::Private>, JwtError> {
        let pem = self
            .private_pem
            .as_ref()
            .ok_or_else(|| JwtError::UnsupportedAlgorithm {
                alg: "rsa-sign-without-private-key".into(),
            })?;
        openssl::rsa::Rsa::private_key_from_pem(pem).map_err(Into::into)
    }
}

fn decode_fragment(fragment: &str) -> Result<BigNum, JwtError> {
    let bytes = base64url::decode(fragment)?;
    BigNum::from_slice(&bytes).map_err(Into::into)
}

/// An X.509 certificate-backed key. Certificate chain validation itself is
/// delegated to a caller-supplied `CertificateValidator` (spec §1); this type only
/// carries the DER bytes needed for thumbprint-based `kid` matching.
#[derive(Clone, Debug)]
pub struct X509Key {
    key_id: Option<String>,
    der: Vec<u8>,
}

impl X509Key {
    pub fn new(der: impl Into<Vec<u8>>) -> Self {
        X509Key {
            key_id: None,
            der: der.into(),
        }
    }

    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub fn der_bytes(&self) -> &[u8] {
        &self.der
    }

    /// `x5t` — base64url SHA-1 thumbprint of the certificate DER.
    pub fn thumbprint_sha1(&self) -> Result<String, JwtError> {
        let digest = hash(MessageDigest::sha1(), &self.der)?;
        Ok(base64url::encode(&digest))
    }

    /// `x5t#S256` — base64url SHA-256 thumbprint of the certificate DER.
    pub fn thumbprint_sha256(&self) -> Result<String, JwtError> {
        let digest = hash(MessageDigest::sha256(), &self.der)?;
        Ok(base64url::encode(&digest))
    }
}

/// One of the three key shapes the data model recognizes.
#[derive(Clone, Debug)]
pub enum SecurityKey {
    Symmetric(SymmetricKey),
    Rsa(RsaKeyMaterial),
    X509(X509Key),
}

impl SecurityKey {
    /// The key's own identifier, if any — compared against header `kid` hints
    /// during candidate matching.
    pub fn key_id(&self) -> Option<&str> {
        match self {
            SecurityKey::Symmetric(k) => k.key_id.as_deref(),
            SecurityKey::Rsa(k) => k.key_id.as_deref(),
            SecurityKey::X509(k) => k.key_id.as_deref(),
        }
    }
}

/// A `SecurityKey` bundled with the algorithm it should be used under.
#[derive(Clone, Debug)]
pub struct SigningCredentials {
    pub key: SecurityKey,
    /// Internal algorithm name (see `crate::algorithm`).
    pub algorithm: String,
}

impl SigningCredentials {
    pub fn new(key: SecurityKey, algorithm: impl Into<String>) -> Self {
        SigningCredentials {
            key,
            algorithm: algorithm.into(),
        }
    }
}

/// Key-identifier hints extracted from a JWT header, used to shortlist candidate
/// keys before attempting signature verification.
#[derive(Clone, Default, Debug)]
pub struct KeyHints {
    pub kid: Option<String>,
    pub x5t: Option<String>,
    pub x5t_s256: Option<String>,
}

/// The kid-matching rule (spec §4.7, resolved in §9/DESIGN.md): generic `kid`
/// string equality applies to every key type; X.509 keys additionally match via
/// thumbprint-clause equality. This is deliberately a free function, not a method
/// on `SecurityKey`, so additional key types can participate without the type
/// needing to know about `KeyHints` itself (spec §9's "small interface").
pub fn key_matches(key: &SecurityKey, hints: &KeyHints) -> bool {
    if let (Some(kid), Some(key_id)) = (&hints.kid, key.key_id()) {
        if kid == key_id {
            return true;
        }
    }
    if let SecurityKey::X509(x509) = key {
        if let Some(hint) = &hints.x5t {
            if matches!(x509.thumbprint_sha1(), Ok(tp) if &tp == hint) {
                return true;
            }
        }
        if let Some(hint) = &hints.x5t_s256 {
            if matches!(x509.thumbprint_sha256(), Ok(tp) if &tp == hint) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_kid_matches_generic_equality() {
        let key = SecurityKey::Symmetric(SymmetricKey::new(vec![1, 2, 3]).with_key_id("v1"));
        let hints = KeyHints {
            kid: Some("v1".into()),
            ..Default::default()
        };
        assert!(key_matches(&key, &hints));
    }

    #[test]
    fn symmetric_kid_mismatch_does_not_match() {
        let key = SecurityKey::Symmetric(SymmetricKey::new(vec![1, 2, 3]).with_key_id("v1"));
        let hints = KeyHints {
            kid: Some("v2".into()),
            ..Default::default()
        };
        assert!(!key_matches(&key, &hints));
    }

    #[test]
    fn no_hints_never_matches() {
        let key = SecurityKey::Symmetric(SymmetricKey::new(vec![1, 2, 3]).with_key_id("v1"));
        assert!(!key_matches(&key, &KeyHints::default()));
    }
}
