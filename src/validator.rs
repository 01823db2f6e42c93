//! The validation pipeline: spec §4.7, the hardest and largest part of this
//! crate. Each step is a gate — failure short-circuits with that category's error,
//! and steps MUST NOT be reordered (step order is observable: earlier failures
//! mask later ones).

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::algorithm::AlgorithmMap;
use crate::claims::{build_principal, ClaimsPrincipal};
use crate::error::JwtError;
use crate::jwt::Jwt;
use crate::key::{key_matches, SecurityKey, X509Key};
use crate::payload::NumericDate;
use crate::provider::{Intent, ProviderFactory};
use crate::serializer::{self, DEFAULT_MAX_TOKEN_SIZE_BYTES};

/// Default symmetric clock-skew tolerance applied to `nbf`/`exp` comparisons.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(5 * 60);

/// Caller-supplied override for issuer validation. Returns the authoritative
/// matched issuer string on success.
pub type IssuerValidator =
    Arc<dyn Fn(&str, &Jwt, &ValidationParameters) -> Result<String, JwtError> + Send + Sync>;

/// Caller-supplied override for audience validation.
pub type AudienceValidator =
    Arc<dyn Fn(&[String], &Jwt, &ValidationParameters) -> Result<(), JwtError> + Send + Sync>;

/// Caller-supplied override for lifetime validation, replacing step 4 entirely.
pub type LifetimeValidator = Arc<
    dyn Fn(Option<NumericDate>, Option<NumericDate>, &Jwt, &ValidationParameters) -> Result<(), JwtError>
        + Send
        + Sync,
>;

/// Lazily-consulted source of candidate signing keys for a given raw token. Modeled
/// as a plain function returning a `Vec` rather than a boxed iterator: the core
/// only ever calls it once per `validate`, so the "lazy" contract from spec §5
/// reduces to "not called until step 3 is reached," which this satisfies without
/// needing a `Clone`-able iterator type.
pub type KeyRetriever = Arc<dyn Fn(&str) -> Vec<SecurityKey> + Send + Sync>;

/// External collaborator for X.509 certificate chain validation (spec §1 — out of
/// scope for this crate to implement).
pub type CertificateValidator = Arc<dyn Fn(&X509Key) -> Result<(), JwtError> + Send + Sync>;

/// Per-token override of the claim type used as the identity's "name" claim.
pub type NameClaimTypeRetriever = Arc<dyn Fn(&Jwt) -> String + Send + Sync>;

/// Per-token override of the claim type used as the identity's "role" claim.
pub type RoleClaimTypeRetriever = Arc<dyn Fn(&Jwt) -> String + Send + Sync>;

/// Policy inputs for a single `validate` call (spec §3). Immutable for the
/// duration of that call; cheap to `Clone` since overrides are `Arc`-wrapped.
#[derive(Clone)]
pub struct ValidationParameters {
    pub valid_issuers: HashSet<String>,
    pub issuer_validator: Option<IssuerValidator>,

    pub valid_audiences: HashSet<String>,
    pub validate_audience: bool,
    pub audience_validator: Option<AudienceValidator>,

    pub issuer_signing_key: Option<SecurityKey>,
    pub issuer_signing_keys: Vec<SecurityKey>,
    pub issuer_signing_key_retriever: Option<KeyRetriever>,

    pub validate_lifetime: bool,
    pub clock_skew: Duration,
    pub require_expiration_time: bool,
    pub lifetime_validator: Option<LifetimeValidator>,

    pub require_signed_tokens: bool,

    pub validate_actor: bool,
    pub max_actor_depth: u8,
    pub validate_issuer_signing_key: bool,
    pub certificate_validator: Option<CertificateValidator>,

    pub name_claim_type: String,
    pub role_claim_type: String,
    pub name_claim_type_retriever: Option<NameClaimTypeRetriever>,
    pub role_claim_type_retriever: Option<RoleClaimTypeRetriever>,
    pub inbound_claim_type_map: Option<HashMap<String, String>>,
    pub claim_type_filter: HashSet<String>,

    pub save_signin_token: bool,
    pub authentication_type: String,

    pub max_token_size_bytes: usize,
    pub algorithm_map: AlgorithmMap,
}

impl Default for ValidationParameters {
    fn default() -> Self {
        ValidationParameters {
            valid_issuers: HashSet::new(),
            issuer_validator: None,
            valid_audiences: HashSet::new(),
            validate_audience: true,
            audience_validator: None,
            issuer_signing_key: None,
            issuer_signing_keys: Vec::new(),
            issuer_signing_key_retriever: None,
            validate_lifetime: true,
            clock_skew: DEFAULT_CLOCK_SKEW,
            require_expiration_time: false,
            lifetime_validator: None,
            require_signed_tokens: true,
            validate_actor: false,
            max_actor_depth: 1,
            validate_issuer_signing_key: false,
            certificate_validator: None,
            name_claim_type: "sub".to_string(),
            role_claim_type: "role".to_string(),
            name_claim_type_retriever: None,
            role_claim_type_retriever: None,
            inbound_claim_type_map: None,
            claim_type_filter: HashSet::new(),
            save_signin_token: false,
            authentication_type: "jwt".to_string(),
            max_token_size_bytes: DEFAULT_MAX_TOKEN_SIZE_BYTES,
            algorithm_map: AlgorithmMap::default(),
        }
    }
}

fn now_seconds() -> NumericDate {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as NumericDate
}

/// `validate(s, params) -> (Jwt, ClaimsPrincipal)` per spec §6/§4.7.
pub fn validate(raw: &str, params: &ValidationParameters) -> Result<(Jwt, ClaimsPrincipal), JwtError> {
    validate_with_depth(raw, params, 0)
}

fn validate_with_depth(
    raw: &str,
    params: &ValidationParameters,
    depth: u8,
) -> Result<(Jwt, ClaimsPrincipal), JwtError> {
    // Step 1: pre-checks.
    if raw.trim().is_empty() {
        return Err(JwtError::ArgumentMissing("token".into()));
    }
    if raw.len() > params.max_token_size_bytes {
        return Err(JwtError::TokenTooLarge {
            actual: raw.len(),
            limit: params.max_token_size_bytes,
        });
    }
    if !serializer::can_read(raw, params.max_token_size_bytes) {
        return Err(JwtError::MalformedToken(
            "token does not match the compact-serialization grammar".into(),
        ));
    }

    // Step 2: parse.
    let mut jwt = serializer::decode(raw, params.max_token_size_bytes)?;
    debug!(alg = ?jwt.header.alg().ok(), "parsed token structurally");

    // Step 3: signature verification.
    verify_signature(&mut jwt, params)?;

    // Step 4: lifetime.
    if params.validate_lifetime {
        check_lifetime(&jwt, params)?;
    }

    // Step 5: audience.
    if params.validate_audience {
        check_audience(&jwt, params)?;
    }

    // Step 6: issuer.
    let validated_issuer = check_issuer(&jwt, params)?;

    // Step 7: actor.
    let actor_principal = if params.validate_actor {
        match jwt.payload.actort() {
            Some(actort) if !actort.is_empty() => {
                if depth + 1 > params.max_actor_depth {
                    warn!(depth, "actor recursion depth exceeded");
                    return Err(JwtError::ActorDepthExceeded);
                }
                let actort = actort.to_string();
                match validate_with_depth(&actort, params, depth + 1) {
                    Ok((_, principal)) => Some(principal),
                    Err(cause) => return Err(JwtError::InvalidActor(Box::new(cause))),
                }
            }
            _ => None,
        }
    } else {
        None
    };

    // Step 8: signing-key policy.
    if params.validate_issuer_signing_key {
        if let Some(key) = &jwt.signing_key {
            check_signing_key_policy(key, params)?;
        }
    }

    // Step 9: build principal.
    let identity = build_principal(&jwt, &validated_issuer, params, actor_principal);
    Ok((jwt, ClaimsPrincipal { identity }))
}

fn verify_signature(jwt: &mut Jwt, params: &ValidationParameters) -> Result<(), JwtError> {
    let wire_alg = jwt.header.alg()?.to_string();
    let internal_alg = params.algorithm_map.to_internal(&wire_alg).to_string();

    if jwt.signature.is_empty() {
        if params.require_signed_tokens {
            return Err(JwtError::SignatureRequired);
        }
        debug!("accepting unsigned token: require_signed_tokens is false");
        return Ok(());
    }

    let hints = jwt.header.key_hints();
    let candidates = enumerate_candidates(jwt, params);

    let (matched, unmatched): (Vec<SecurityKey>, Vec<SecurityKey>) =
        candidates.into_iter().partition(|key| key_matches(key, &hints));
    let any_matched = !matched.is_empty();

    let factory = ProviderFactory::new();
    let mut diagnostics = Vec::new();
    let mut first_cause: Option<JwtError> = None;
    let mut attempted = 0usize;

    for key in matched.into_iter().chain(unmatched) {
        attempted += 1;
        let provider = match factory.resolve(&key, &internal_alg, Intent::Verify) {
            Some(provider) => provider,
            None => {
                let cause = JwtError::UnsupportedAlgorithm { alg: internal_alg.clone() };
                diagnostics.push(format!("kid={:?}: {cause}", key.key_id()));
                if first_cause.is_none() {
                    first_cause = Some(cause);
                }
                continue;
            }
        };
        let result = provider.verify(&jwt.signing_input, &jwt.signature);
        factory.release(provider);
        match result {
            Ok(true) => {
                jwt.signing_key = Some(key);
                return Ok(());
            }
            Ok(false) => diagnostics.push(format!("kid={:?}: signature mismatch", key.key_id())),
            Err(e) => {
                diagnostics.push(format!("kid={:?}: {e}", key.key_id()));
                if first_cause.is_none() {
                    first_cause = Some(e);
                }
            }
        }
    }

    let diagnostics = diagnostics.join("; ");
    if any_matched {
        warn!(diagnostics = %diagnostics, "kid matched but no candidate verified");
        Err(JwtError::SigningKeyNotFound {
            diagnostics,
            first_cause: first_cause.map(Box::new),
        })
    } else {
        warn!(diagnostics = %diagnostics, "no candidate key verified the signature");
        Err(JwtError::InvalidSignature { attempted, diagnostics })
    }
}

fn enumerate_candidates(jwt: &Jwt, params: &ValidationParameters) -> Vec<SecurityKey> {
    let mut candidates = Vec::new();
    if let Some(retriever) = &params.issuer_signing_key_retriever {
        let raw = jwt.raw.as_deref().unwrap_or_default();
        candidates.extend(retriever(raw));
    }
    if let Some(key) = &params.issuer_signing_key {
        candidates.push(key.clone());
    }
    candidates.extend(params.issuer_signing_keys.iter().cloned());
    candidates
}

fn check_lifetime(jwt: &Jwt, params: &ValidationParameters) -> Result<(), JwtError> {
    if let Some(custom) = &params.lifetime_validator {
        let nbf = jwt.payload.nbf()?;
        let exp = jwt.payload.exp()?;
        return custom(nbf, exp, jwt, params);
    }

    let nbf = jwt.payload.nbf()?;
    let exp = jwt.payload.exp()?;

    if params.require_expiration_time && exp.is_none() {
        return Err(JwtError::NoExpiration);
    }

    let now = now_seconds();
    let skew = params.clock_skew.as_secs() as NumericDate;

    if let Some(nbf) = nbf {
        if nbf > now + skew {
            return Err(JwtError::NotYetValid);
        }
    }
    if let Some(exp) = exp {
        if now - skew >= exp {
            return Err(JwtError::Expired);
        }
    }
    Ok(())
}

fn check_audience(jwt: &Jwt, params: &ValidationParameters) -> Result<(), JwtError> {
    if let Some(custom) = &params.audience_validator {
        let audiences = jwt.payload.aud_set();
        return custom(&audiences, jwt, params);
    }
    let audiences = jwt.payload.aud_set();
    if audiences.iter().any(|a| params.valid_audiences.contains(a)) {
        Ok(())
    } else {
        Err(JwtError::InvalidAudience)
    }
}

fn check_issuer(jwt: &Jwt, params: &ValidationParameters) -> Result<String, JwtError> {
    if let Some(custom) = &params.issuer_validator {
        let issuer = jwt.payload.iss().unwrap_or_default();
        return custom(issuer, jwt, params);
    }
    match jwt.payload.iss() {
        Some(issuer) if params.valid_issuers.contains(issuer) => Ok(issuer.to_string()),
        _ => Err(JwtError::InvalidIssuer),
    }
}

fn check_signing_key_policy(key: &SecurityKey, params: &ValidationParameters) -> Result<(), JwtError> {
    match key {
        SecurityKey::X509(x509) => match &params.certificate_validator {
            Some(validator) => validator(x509).map_err(|_| JwtError::InvalidSigningKey),
            // No certificate validator configured: the capability this crate
            // delegates to (spec §1) was not supplied, so there is nothing to
            // reject against — default to accept, matching the "for other keys,
            // the default policy accepts" fallback the spec describes.
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build, TokenDescriptor};
    use crate::key::{SecurityKey, SigningCredentials, SymmetricKey};
    use serde_json::Map;
    use serde_json::Value;

    fn key_bytes() -> Vec<u8> {
        vec![0u8; 32]
    }

    fn base_params() -> ValidationParameters {
        let mut params = ValidationParameters::default();
        params.valid_issuers.insert("https://issuer".to_string());
        params.valid_audiences.insert("api".to_string());
        params.issuer_signing_key = Some(SecurityKey::Symmetric(SymmetricKey::new(key_bytes())));
        params
    }

    fn signed_token(claims: Map<String, Value>, not_before: i64, expires: i64) -> String {
        let descriptor = TokenDescriptor {
            issuer: Some("https://issuer".into()),
            audiences: vec!["api".into()],
            claims,
            not_before: Some(not_before),
            expires: Some(expires),
            signing_credentials: Some(SigningCredentials::new(
                SecurityKey::Symmetric(SymmetricKey::new(key_bytes())),
                crate::algorithm::HS256.to_string(),
            )),
            actor: None,
        };
        crate::builder::write_token_descriptor(&descriptor, &AlgorithmMap::default()).unwrap()
    }

    #[test]
    fn hs256_round_trip_scenario_1() {
        let now = now_seconds();
        let token = signed_token(Map::new(), now, now + 600);
        let params = base_params();
        let (_, principal) = validate(&token, &params).unwrap();
        assert_eq!(principal.identity.find("iss"), Some("https://issuer"));
        assert_eq!(principal.identity.find("aud"), Some("api"));
    }

    #[test]
    fn expired_scenario_2() {
        let now = now_seconds();
        let token = signed_token(Map::new(), now - 700, now - 10);
        let mut params = base_params();
        params.clock_skew = Duration::from_secs(0);
        assert!(matches!(validate(&token, &params), Err(JwtError::Expired)));
    }

    #[test]
    fn wrong_audience_scenario_3() {
        let now = now_seconds();
        let descriptor = TokenDescriptor {
            issuer: Some("https://issuer".into()),
            audiences: vec!["other".into()],
            claims: Map::new(),
            not_before: Some(now),
            expires: Some(now + 600),
            signing_credentials: Some(SigningCredentials::new(
                SecurityKey::Symmetric(SymmetricKey::new(key_bytes())),
                crate::algorithm::HS256.to_string(),
            )),
            actor: None,
        };
        let token = crate::builder::write_token_descriptor(&descriptor, &AlgorithmMap::default()).unwrap();
        let params = base_params();
        assert!(matches!(validate(&token, &params), Err(JwtError::InvalidAudience)));
    }

    #[test]
    fn tampered_payload_scenario_4() {
        let now = now_seconds();
        let token = signed_token(Map::new(), now, now + 600);
        let mut parts: Vec<&str> = token.split('.').collect();
        let mut payload_bytes = crate::base64url::decode(parts[1]).unwrap();
        payload_bytes[0] ^= 0xff;
        let tampered_payload = crate::base64url::encode(&payload_bytes);
        parts[1] = &tampered_payload;
        let tampered = parts.join(".");
        let params = base_params();
        assert!(matches!(validate(&tampered, &params), Err(JwtError::InvalidSignature { .. })));
    }

    #[test]
    fn key_rollover_scenario_5() {
        let now = now_seconds();
        let k1 = SecurityKey::Symmetric(SymmetricKey::new(vec![1u8; 32]).with_key_id("v1"));
        let descriptor = TokenDescriptor {
            issuer: Some("https://issuer".into()),
            audiences: vec!["api".into()],
            claims: Map::new(),
            not_before: Some(now),
            expires: Some(now + 600),
            signing_credentials: Some(SigningCredentials::new(k1, crate::algorithm::HS256.to_string())),
            actor: None,
        };
        let token = crate::builder::write_token_descriptor(&descriptor, &AlgorithmMap::default()).unwrap();

        let k2 = SecurityKey::Symmetric(SymmetricKey::new(vec![2u8; 32]).with_key_id("v1"));
        let mut params = base_params();
        params.issuer_signing_key = None;
        params.issuer_signing_keys = vec![k2];
        assert!(matches!(
            validate(&token, &params),
            Err(JwtError::SigningKeyNotFound { .. })
        ));
    }

    #[test]
    fn signing_key_not_found_captures_first_cause_for_unsupported_algorithm() {
        // A token whose header claims RS256 but was actually signed with an HMAC
        // key: the kid matches, so the candidate is in the "matched" set, but the
        // provider factory cannot pair a symmetric key with an RSA algorithm.
        let header = crate::header::Header::signed("RS256", Some("v1"));
        let payload = crate::payload::Payload::from_map(Map::new());
        let signing_input = crate::serializer::signing_input(&header, &payload).unwrap();

        let hmac_key = SecurityKey::Symmetric(SymmetricKey::new(vec![1u8; 32]).with_key_id("v1"));
        let factory = ProviderFactory::new();
        let signer = factory
            .resolve(&hmac_key, crate::algorithm::HS256, Intent::Sign)
            .unwrap();
        let signature = signer.sign(&signing_input).unwrap();
        let raw = crate::serializer::assemble(&signing_input, &signature).unwrap();

        let mut params = base_params();
        params.issuer_signing_key = None;
        params.issuer_signing_keys = vec![hmac_key];

        match validate(&raw, &params) {
            Err(JwtError::SigningKeyNotFound { first_cause, .. }) => {
                assert!(matches!(
                    first_cause.as_deref(),
                    Some(JwtError::UnsupportedAlgorithm { .. })
                ));
            }
            other => panic!("expected SigningKeyNotFound, got {other:?}"),
        }
    }

    #[test]
    fn unsigned_token_rejected_when_signed_required_scenario_4_property() {
        let descriptor = TokenDescriptor::default();
        let jwt = build(&descriptor, &AlgorithmMap::default()).unwrap();
        let raw = crate::builder::write_token_jwt(&jwt).unwrap();
        let params = ValidationParameters::default();
        assert!(matches!(validate(&raw, &params), Err(JwtError::SignatureRequired)));
    }

    #[test]
    fn actor_depth_exceeded() {
        let now = now_seconds();
        let mut params = base_params();
        params.validate_actor = true;
        params.max_actor_depth = 0;

        let mut claims = Map::new();
        claims.insert("actort".into(), Value::String("x.y.".into()));
        let token = signed_token(claims, now, now + 600);

        assert!(matches!(
            validate(&token, &params),
            Err(JwtError::ActorDepthExceeded)
        ));
    }
}
