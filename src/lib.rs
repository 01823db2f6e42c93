//! Creation, serialization, and policy-driven validation of compact-serialized
//! JSON Web Tokens (RFC 7519, RFC 7515, and the RSA/HMAC SHA-2 family of RFC 7518).
//!
//! The cryptographic primitives are exposed behind [`provider::SignatureProvider`]
//! so callers can substitute their own (an HSM-backed signer, say); concrete
//! HMAC and RSA implementations ship so the crate works out of the box.
//!
//! ## Usage example (HMAC-signed token)
//!
//! ```rust
//! use jwt_core::algorithm::{AlgorithmMap, HS256};
//! use jwt_core::builder::{build, TokenDescriptor};
//! use jwt_core::key::{SecurityKey, SigningCredentials, SymmetricKey};
//! use jwt_core::validator::ValidationParameters;
//!
//! let algorithm_map = AlgorithmMap::default();
//! let credentials = SigningCredentials::new(
//!     SecurityKey::Symmetric(SymmetricKey::new(vec![0u8; 32])),
//!     HS256.to_string(),
//! );
//!
//! let descriptor = TokenDescriptor {
//!     issuer: Some("https://issuer".into()),
//!     audiences: vec!["api".into()],
//!     signing_credentials: Some(credentials),
//!     ..Default::default()
//! };
//! let jwt = build(&descriptor, &algorithm_map).expect("token should build");
//! let token = jwt_core::write_token(&jwt).expect("token should serialize");
//!
//! let mut params = ValidationParameters::default();
//! params.valid_issuers.insert("https://issuer".into());
//! params.valid_audiences.insert("api".into());
//! params.issuer_signing_key = Some(jwt.signing_key.clone().unwrap());
//!
//! let (_, principal) = jwt_core::validate(&token, &params).expect("token should validate");
//! assert_eq!(principal.identity.find("iss"), Some("https://issuer"));
//! ```

pub mod algorithm;
pub mod base64url;
pub mod builder;
pub mod claims;
pub mod error;
pub mod header;
pub mod jwt;
pub mod key;
pub mod payload;
pub mod provider;
pub mod serializer;
pub mod validator;

pub use builder::TokenDescriptor;
pub use claims::ClaimsPrincipal;
pub use error::JwtError;
pub use jwt::Jwt;
pub use validator::ValidationParameters;

/// `create_token(issuer, audience, claims, lifetime, signing_credentials) -> Jwt`
/// per spec §6, using the process-default `AlgorithmMap`. Callers that registered
/// custom algorithm remappings should call
/// [`builder::create_token_with_algorithm_map`] directly with their own map.
pub fn create_token(
    issuer: Option<&str>,
    audience: Option<&str>,
    claims: serde_json::Map<String, serde_json::Value>,
    lifetime: (Option<payload::NumericDate>, Option<payload::NumericDate>),
    signing_credentials: Option<key::SigningCredentials>,
) -> Result<Jwt, JwtError> {
    builder::create_token_with_algorithm_map(
        issuer,
        audience,
        claims,
        lifetime,
        signing_credentials,
        &algorithm::AlgorithmMap::default(),
    )
}

/// `read_token(s) -> Jwt` per spec §6: structural decode only, no validation.
pub fn read_token(raw: &str) -> Result<Jwt, JwtError> {
    serializer::decode(raw, serializer::DEFAULT_MAX_TOKEN_SIZE_BYTES)
}

/// `can_read(s) -> bool` per spec §6/§4.6.
pub fn can_read(raw: &str) -> bool {
    serializer::can_read(raw, serializer::DEFAULT_MAX_TOKEN_SIZE_BYTES)
}

/// `validate(s, params) -> (Jwt, ClaimsPrincipal)` per spec §6/§4.7.
pub fn validate(raw: &str, params: &ValidationParameters) -> Result<(Jwt, ClaimsPrincipal), JwtError> {
    validator::validate(raw, params)
}

/// `write_token(jwt) -> string` per spec §6.
pub fn write_token(jwt: &Jwt) -> Result<String, JwtError> {
    builder::write_token_jwt(jwt)
}

/// `write_token(descriptor) -> string` per spec §6.
pub fn write_token_from_descriptor(
    descriptor: &TokenDescriptor,
    algorithm_map: &algorithm::AlgorithmMap,
) -> Result<String, JwtError> {
    builder::write_token_descriptor(descriptor, algorithm_map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_read_matches_read_token_acceptance() {
        let descriptor = TokenDescriptor::default();
        let jwt = builder::build(&descriptor, &algorithm::AlgorithmMap::default()).unwrap();
        let raw = write_token(&jwt).unwrap();
        assert!(can_read(&raw));
        assert!(read_token(&raw).is_ok());
    }

    #[test]
    fn can_read_rejects_garbage() {
        assert!(!can_read("not a jwt"));
        assert!(read_token("not a jwt").is_err());
    }
}
