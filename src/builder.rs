//! Token construction: assembling a signed (or unsigned) compact JWT from a
//! caller-supplied descriptor (spec §4.5), including the recursive `actort` value
//! construction used when the subject carries a delegated actor identity (§4.9).

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};

use crate::algorithm::AlgorithmMap;
use crate::error::JwtError;
use crate::header::Header;
use crate::jwt::Jwt;
use crate::key::SigningCredentials;
use crate::payload::{NumericDate, Payload};
use crate::provider::{Intent, ProviderFactory};
use crate::serializer;

/// Default token lifetime, applied when a descriptor leaves `expires` unset.
pub const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 60 * 60;

/// Where the `actort` claim's value comes from when the subject's actor identity
/// was not freshly minted by this call (spec §4.9 rules 1-3).
pub enum BootstrapContext {
    /// Rules 1 and 3: an already-serialized token string, used verbatim. The
    /// spec's C#-flavored source distinguishes "bootstrap context is a string"
    /// from "bootstrap context holds a raw token string" as two call sites
    /// reaching the same value by different paths; this model collapses them into
    /// one variant since the resulting behavior — use the string verbatim — is
    /// identical either way.
    RawString(String),
    /// Rule 2: a validated `Jwt` value. Its `raw` form is used if present,
    /// otherwise it is re-serialized.
    Token(Jwt),
}

/// The actor identity to embed as the `actort` claim when building a token whose
/// subject delegates from another identity.
pub struct ActorDescriptor {
    pub claims: Map<String, Value>,
    pub bootstrap_context: Option<BootstrapContext>,
}

/// Compute the `actort` claim value per spec §4.9, falling back through rules 1-4
/// in order.
pub fn actor_value(actor: &ActorDescriptor) -> Result<String, JwtError> {
    match &actor.bootstrap_context {
        Some(BootstrapContext::RawString(s)) => Ok(s.clone()),
        Some(BootstrapContext::Token(jwt)) => match &jwt.raw {
            Some(raw) => Ok(raw.clone()),
            None => write_token_jwt(jwt),
        },
        None => {
            // Rule 4: build a fresh unsigned JWT carrying the actor's claims.
            let header = Header::unsigned();
            let payload = Payload::from_map(actor.claims.clone());
            let signing_input = serializer::signing_input(&header, &payload)?;
            serializer::assemble(&signing_input, &[])
        }
    }
}

/// Everything needed to assemble a signed or unsigned compact JWT.
pub struct TokenDescriptor {
    pub issuer: Option<String>,
    pub audiences: Vec<String>,
    /// Non-reserved (and, if the caller wants to override a reserved one
    /// explicitly, reserved) claims. Reserved values set via the dedicated fields
    /// below take precedence when both are present.
    pub claims: Map<String, Value>,
    pub not_before: Option<NumericDate>,
    pub expires: Option<NumericDate>,
    pub signing_credentials: Option<SigningCredentials>,
    pub actor: Option<ActorDescriptor>,
}

impl Default for TokenDescriptor {
    fn default() -> Self {
        TokenDescriptor {
            issuer: None,
            audiences: Vec::new(),
            claims: Map::new(),
            not_before: None,
            expires: None,
            signing_credentials: None,
            actor: None,
        }
    }
}

fn now_seconds() -> NumericDate {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as NumericDate
}

/// Assemble header + payload, sign (if credentials were supplied), and return the
/// resulting `Jwt`. Never mutates the caller's `descriptor.claims` map — it is
/// only read from, and a fresh `Payload` is produced.
pub fn build(descriptor: &TokenDescriptor, algorithm_map: &AlgorithmMap) -> Result<Jwt, JwtError> {
    let factory = ProviderFactory::new();

    let wire_alg = match &descriptor.signing_credentials {
        Some(sc) => algorithm_map.to_wire(&sc.algorithm),
        None => "none",
    };
    let kid = descriptor
        .signing_credentials
        .as_ref()
        .and_then(|sc| sc.key.key_id());
    let header = Header::signed(wire_alg, kid);

    let mut payload = Payload::from_map(descriptor.claims.clone());
    if let Some(issuer) = &descriptor.issuer {
        payload.set_iss(issuer.clone());
    }
    if !descriptor.audiences.is_empty() {
        payload.set_aud(&descriptor.audiences);
    }
    let not_before = descriptor.not_before.unwrap_or_else(now_seconds);
    let expires = descriptor
        .expires
        .unwrap_or(not_before + DEFAULT_TOKEN_LIFETIME_SECONDS);
    payload.set_nbf(not_before);
    payload.set_exp(expires);

    if let Some(actor) = &descriptor.actor {
        payload.set_actort(actor_value(actor)?);
    }

    let signing_input = serializer::signing_input(&header, &payload)?;

    let signature = match &descriptor.signing_credentials {
        Some(sc) => {
            let provider = factory
                .resolve(&sc.key, &sc.algorithm, Intent::Sign)
                .ok_or_else(|| JwtError::UnsupportedAlgorithm {
                    alg: sc.algorithm.clone(),
                })?;
            let sig = provider.sign(&signing_input)?;
            factory.release(provider);
            sig
        }
        None => Vec::new(),
    };

    let raw = serializer::assemble(&signing_input, &signature)?;
    let mut jwt = Jwt::new(header, payload, signing_input, signature, Some(raw));
    jwt.signing_key = descriptor.signing_credentials.as_ref().map(|sc| sc.key.clone());
    Ok(jwt)
}

/// `create_token` per spec §6: a convenience wrapper over `build` with the common
/// parameters spelled out positionally. Takes an explicit `algorithm_map` since,
/// unlike `validate`, the spec's `create_token` signature carries no
/// `ValidationParameters`-style bag to hide one inside; `jwt_core::create_token`
/// wraps this with the process default for the common case.
pub fn create_token_with_algorithm_map(
    issuer: Option<&str>,
    audience: Option<&str>,
    claims: Map<String, Value>,
    lifetime: (Option<NumericDate>, Option<NumericDate>),
    signing_credentials: Option<SigningCredentials>,
    algorithm_map: &AlgorithmMap,
) -> Result<Jwt, JwtError> {
    let descriptor = TokenDescriptor {
        issuer: issuer.map(str::to_string),
        audiences: audience.map(|a| vec![a.to_string()]).unwrap_or_default(),
        claims,
        not_before: lifetime.0,
        expires: lifetime.1,
        signing_credentials,
        actor: None,
    };
    build(&descriptor, algorithm_map)
}

/// `write_token(jwt) -> string` per spec §6: re-serialize an already-built `Jwt`,
/// recomputing the compact string from its current header/payload/signature
/// rather than relying on a previously-stored `raw`.
pub fn write_token_jwt(jwt: &Jwt) -> Result<String, JwtError> {
    serializer::assemble(&jwt.signing_input, &jwt.signature)
}

/// `write_token(descriptor) -> string` per spec §6.
pub fn write_token_descriptor(
    descriptor: &TokenDescriptor,
    algorithm_map: &AlgorithmMap,
) -> Result<String, JwtError> {
    let jwt = build(descriptor, algorithm_map)?;
    write_token_jwt(&jwt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{SecurityKey, SymmetricKey};

    fn hmac_credentials() -> SigningCredentials {
        SigningCredentials::new(
            SecurityKey::Symmetric(SymmetricKey::new(vec![0u8; 32])),
            crate::algorithm::HS256.to_string(),
        )
    }

    #[test]
    fn builder_does_not_mutate_caller_claims() {
        let mut claims = Map::new();
        claims.insert("sub".into(), Value::String("alice".into()));
        let descriptor = TokenDescriptor {
            claims: claims.clone(),
            signing_credentials: Some(hmac_credentials()),
            ..Default::default()
        };
        let _ = build(&descriptor, &AlgorithmMap::default()).unwrap();
        assert_eq!(claims.get("sub").and_then(Value::as_str), Some("alice"));
    }

    #[test]
    fn unsigned_token_uses_none_alg() {
        let descriptor = TokenDescriptor::default();
        let jwt = build(&descriptor, &AlgorithmMap::default()).unwrap();
        assert_eq!(jwt.header.alg().unwrap(), "none");
        assert!(jwt.signature.is_empty());
    }

    #[test]
    fn signed_token_carries_kid_when_key_has_one() {
        let credentials = SigningCredentials::new(
            SecurityKey::Symmetric(SymmetricKey::new(vec![0u8; 32]).with_key_id("v1")),
            crate::algorithm::HS256.to_string(),
        );
        let descriptor = TokenDescriptor {
            signing_credentials: Some(credentials),
            ..Default::default()
        };
        let jwt = build(&descriptor, &AlgorithmMap::default()).unwrap();
        assert_eq!(jwt.header.kid(), Some("v1"));
    }

    #[test]
    fn actor_value_rule_four_builds_fresh_unsigned_jwt() {
        let mut actor_claims = Map::new();
        actor_claims.insert("sub".into(), Value::String("service-account".into()));
        let actor = ActorDescriptor {
            claims: actor_claims,
            bootstrap_context: None,
        };
        let value = actor_value(&actor).unwrap();
        assert_eq!(value.split('.').count(), 3);
    }

    #[test]
    fn actor_value_rule_one_uses_raw_string_verbatim() {
        let actor = ActorDescriptor {
            claims: Map::new(),
            bootstrap_context: Some(BootstrapContext::RawString("some.raw.token".into())),
        };
        assert_eq!(actor_value(&actor).unwrap(), "some.raw.token");
    }
}
