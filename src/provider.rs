//! Signature providers and the factory that resolves `(key, algorithm, intent)` to
//! one (spec §4.4).
//!
//! The distilled spec treats `SignatureProvider` as a pure external capability.
//! This crate ships concrete implementations — `HmacProvider` backed by `hmac`+
//! `sha2`, `RsaProvider` backed by `openssl` — because a validation core with no
//! working provider cannot be exercised. The trait boundary still lets a caller
//! substitute their own (an HSM-backed signer, say) without touching the validator.

use hmac::{Hmac, Mac};
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::{Signer as OpenSslSigner, Verifier as OpenSslVerifier};
use sha2::{Sha256, Sha384, Sha512};

use crate::algorithm::{HS256, HS384, HS512, RS256, RS384, RS512};
use crate::error::JwtError;
use crate::key::SecurityKey;

/// What a `SignatureProvider` is being asked to do. Some providers (e.g. an RSA
/// public-components-only key) can only serve one intent.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Intent {
    Sign,
    Verify,
}

/// Capability to sign or verify bytes under a fixed `(key, algorithm)` pairing.
/// Scoped to a single sign-or-verify call; the factory releases it on every exit
/// path via `ProviderFactory::release`.
pub trait SignatureProvider {
    /// Sign `data`, returning the raw signature bytes.
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, JwtError> {
        let _ = data;
        Err(JwtError::UnsupportedAlgorithm {
            alg: "provider does not support signing".into(),
        })
    }

    /// Verify `signature` over `data`.
    fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool, JwtError>;
}

/// HMAC-SHA256/384/512 provider over a `SymmetricKey`.
pub struct HmacProvider {
    key_bytes: Vec<u8>,
    internal_alg: String,
}

macro_rules! hmac_verify {
    ($ty:ty, $key:expr, $data:expr, $sig:expr) => {{
        let mut mac = <Hmac<$ty> as Mac>::new_from_slice($key)
            .map_err(|_| JwtError::MalformedToken("invalid HMAC key length".into()))?;
        mac.update($data);
        Ok(mac.verify_slice($sig).is_ok())
    }};
}

macro_rules! hmac_sign {
    ($ty:ty, $key:expr, $data:expr) => {{
        let mut mac = <Hmac<$ty> as Mac>::new_from_slice($key)
            .map_err(|_| JwtError::MalformedToken("invalid HMAC key length".into()))?;
        mac.update($data);
        Ok(mac.finalize().into_bytes().to_vec())
    }};
}

impl SignatureProvider for HmacProvider {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, JwtError> {
        match self.internal_alg.as_str() {
            HS256 => hmac_sign!(Sha256, &self.key_bytes, data),
            HS384 => hmac_sign!(Sha384, &self.key_bytes, data),
            HS512 => hmac_sign!(Sha512, &self.key_bytes, data),
            other => Err(JwtError::UnsupportedAlgorithm { alg: other.into() }),
        }
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool, JwtError> {
        match self.internal_alg.as_str() {
            HS256 => hmac_verify!(Sha256, &self.key_bytes, data, signature),
            HS384 => hmac_verify!(Sha384, &self.key_bytes, data, signature),
            HS512 => hmac_verify!(Sha512, &self.key_bytes, data, signature),
            other => Err(JwtError::UnsupportedAlgorithm { alg: other.into() }),
        }
    }
}

/// RSASSA-PKCS1-v1_5 SHA256/384/512 provider, following the teacher crate's use of
/// `openssl::sign::{Signer, Verifier}`.
pub struct RsaProvider {
    key: crate::key::RsaKeyMaterial,
    internal_alg: String,
}

impl RsaProvider {
    fn digest(&self) -> Result<MessageDigest, JwtError> {
        match self.internal_alg.as_str() {
            RS256 => Ok(MessageDigest::sha256()),
            RS384 => Ok(MessageDigest::sha384()),
            RS512 => Ok(MessageDigest::sha512()),
            other => Err(JwtError::UnsupportedAlgorithm { alg: other.into() }),
        }
    }
}

impl SignatureProvider for RsaProvider {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, JwtError> {
        let digest = self.digest()?;
        let rsa = self.key.private_key()?;
        let pkey = PKey::from_rsa(rsa)?;
        let mut signer = OpenSslSigner::new(digest, &pkey)?;
        signer.update(data)?;
        Ok(signer.sign_to_vec()?)
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool, JwtError> {
        let digest = self.digest()?;
        let rsa = self.key.public_key()?;
        let pkey = PKey::from_rsa(rsa)?;
        let mut verifier = OpenSslVerifier::new(digest, &pkey)?;
        verifier.update(data)?;
        Ok(verifier.verify(signature)?)
    }
}

/// Resolves `(key, algorithm, intent)` pairs to a boxed `SignatureProvider`.
///
/// Stateless and therefore trivially thread-safe — the "pooling" the spec allows is
/// a no-op here since providers are cheap to construct; `release` exists for API
/// symmetry with the spec and so callers that *do* pool providers have a defined
/// hand-back point.
#[derive(Default)]
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn new() -> Self {
        ProviderFactory
    }

    /// Resolve a provider for `(key, internal_alg, intent)`. Returns `None` iff the
    /// combination is unsupported; the caller treats that as `UnsupportedAlgorithm`.
    pub fn resolve(
        &self,
        key: &SecurityKey,
        internal_alg: &str,
        intent: Intent,
    ) -> Option<Box<dyn SignatureProvider>> {
        match key {
            SecurityKey::Symmetric(sym) => match internal_alg {
                HS256 | HS384 | HS512 => Some(Box::new(HmacProvider {
                    key_bytes: sym.key_bytes(),
                    internal_alg: internal_alg.to_string(),
                })),
                _ => None,
            },
            SecurityKey::Rsa(rsa) => match internal_alg {
                RS256 | RS384 | RS512 => {
                    if intent == Intent::Sign && rsa.private_key().is_err() {
                        return None;
                    }
                    Some(Box::new(RsaProvider {
                        key: rsa.clone(),
                        internal_alg: internal_alg.to_string(),
                    }))
                }
                _ => None,
            },
            SecurityKey::X509(_) => None,
        }
    }

    /// Hand a borrowed provider back to the factory. A no-op today (providers are
    /// not pooled), but kept so call sites follow the borrow/release discipline the
    /// spec describes, in case a future factory implementation does pool.
    pub fn release(&self, _provider: Box<dyn SignatureProvider>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::SymmetricKey;

    #[test]
    fn hmac_round_trip() {
        let factory = ProviderFactory::new();
        let key = SecurityKey::Symmetric(SymmetricKey::new(vec![0u8; 32]));
        let signer = factory.resolve(&key, HS256, Intent::Sign).unwrap();
        let sig = signer.sign(b"header.payload").unwrap();
        factory.release(signer);

        let verifier = factory.resolve(&key, HS256, Intent::Verify).unwrap();
        assert!(verifier.verify(b"header.payload", &sig).unwrap());
        assert!(!verifier.verify(b"tampered", &sig).unwrap());
    }

    #[test]
    fn unsupported_combination_returns_none() {
        let factory = ProviderFactory::new();
        let key = SecurityKey::Symmetric(SymmetricKey::new(vec![0u8; 32]));
        assert!(factory.resolve(&key, RS256, Intent::Verify).is_none());
    }
}
