//! Claims-identity adapter: maps a validated `Jwt` to a `ClaimsPrincipal` (spec
//! §4.8).

use std::collections::HashMap;

use serde_json::Value;

use crate::jwt::Jwt;
use crate::serializer;
use crate::validator::ValidationParameters;

/// The well-known claim type that carries a nested, delegated identity.
pub const ACTOR_CLAIM_TYPE: &str = "actort";

/// A single claim attached to a `ClaimsIdentity`.
#[derive(Clone, Debug)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
    pub issuer: String,
    pub original_issuer: String,
    /// The original short claim name, recorded here when `inbound_claim_type_map`
    /// remapped it to a longer type.
    pub properties: HashMap<String, String>,
}

/// An identity built from a validated JWT's claim set.
#[derive(Clone, Debug)]
pub struct ClaimsIdentity {
    pub authentication_type: String,
    pub name_claim_type: String,
    pub role_claim_type: String,
    pub claims: Vec<Claim>,
    /// At most one nested actor identity (spec §4.8: "at most one actor claim per
    /// identity").
    pub actor: Option<Box<ClaimsIdentity>>,
    /// The raw (or freshly re-serialized) compact string, attached only when
    /// `params.save_signin_token` is set.
    pub bootstrap_context: Option<String>,
}

impl ClaimsIdentity {
    /// The value of the claim named by `name_claim_type`, if present.
    pub fn name(&self) -> Option<&str> {
        self.find(&self.name_claim_type)
    }

    /// The value of the claim named by `role_claim_type`, if present.
    pub fn role(&self) -> Option<&str> {
        self.find(&self.role_claim_type)
    }

    pub fn find(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }
}

/// The principal produced by a successful `validate` call.
#[derive(Clone, Debug)]
pub struct ClaimsPrincipal {
    pub identity: ClaimsIdentity,
}

fn claim_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build a `ClaimsPrincipal` from a validated JWT.
///
/// `actor_principal` is `Some` when the validator's actor step (§4.7 step 7) ran
/// and succeeded; its identity is grafted in directly rather than re-derived. When
/// `None` but the payload carries an `actort` claim that structurally parses as a
/// JWT, a nested *unvalidated* identity is built from its claims (mirroring the
/// source's claims-adapter behavior, which inspects shape rather than
/// authenticity) — callers that need the nested token's signature checked should
/// set `params.validate_actor`.
pub fn build_principal(
    jwt: &Jwt,
    validated_issuer: &str,
    params: &ValidationParameters,
    actor_principal: Option<ClaimsPrincipal>,
) -> ClaimsIdentity {
    let name_claim_type = params
        .name_claim_type_retriever
        .as_ref()
        .map(|f| f(jwt))
        .unwrap_or_else(|| params.name_claim_type.clone());
    let role_claim_type = params
        .role_claim_type_retriever
        .as_ref()
        .map(|f| f(jwt))
        .unwrap_or_else(|| params.role_claim_type.clone());

    let mut claims = Vec::new();
    let mut actor: Option<Box<ClaimsIdentity>> = actor_principal.map(|p| Box::new(p.identity));

    for (name, value) in jwt.payload.as_map() {
        if params.claim_type_filter.contains(name.as_str()) {
            continue;
        }

        if name == ACTOR_CLAIM_TYPE {
            if actor.is_none() {
                if let Value::String(raw_actor) = value {
                    if serializer::can_read(raw_actor, params.max_token_size_bytes) {
                        if let Ok(nested) =
                            serializer::decode(raw_actor, params.max_token_size_bytes)
                        {
                            let nested_issuer = nested.payload.iss().unwrap_or_default().to_string();
                            let nested_identity =
                                build_principal(&nested, &nested_issuer, params, None);
                            actor = Some(Box::new(nested_identity));
                            continue;
                        }
                    }
                }
            } else {
                // Already have a validated actor from step 7; skip the raw claim
                // entirely so it isn't also attached literally.
                continue;
            }
        }

        let (claim_type, properties) = match &params.inbound_claim_type_map {
            Some(map) if map.contains_key(name) => {
                let mut props = HashMap::new();
                props.insert("short_type_name".to_string(), name.clone());
                (map[name].clone(), props)
            }
            _ => (name.clone(), HashMap::new()),
        };

        claims.push(Claim {
            claim_type,
            value: claim_value_to_string(value),
            issuer: validated_issuer.to_string(),
            original_issuer: validated_issuer.to_string(),
            properties,
        });
    }

    let bootstrap_context = if params.save_signin_token {
        jwt.raw
            .clone()
            .map(Ok)
            .unwrap_or_else(|| crate::builder::write_token_jwt(jwt))
            .ok()
    } else {
        None
    };

    ClaimsIdentity {
        authentication_type: params.authentication_type.clone(),
        name_claim_type,
        role_claim_type,
        claims,
        actor,
        bootstrap_context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::AlgorithmMap;
    use crate::builder::{build, TokenDescriptor};
    use crate::key::{SecurityKey, SigningCredentials, SymmetricKey};
    use serde_json::Map;

    fn signed_jwt(claims: Map<String, Value>) -> Jwt {
        let descriptor = TokenDescriptor {
            claims,
            signing_credentials: Some(SigningCredentials::new(
                SecurityKey::Symmetric(SymmetricKey::new(vec![0u8; 32])),
                crate::algorithm::HS256.to_string(),
            )),
            ..Default::default()
        };
        build(&descriptor, &AlgorithmMap::default()).unwrap()
    }

    #[test]
    fn reserved_claims_become_literal_claims() {
        let mut claims = Map::new();
        claims.insert("sub".into(), Value::String("alice".into()));
        let jwt = signed_jwt(claims);
        let params = ValidationParameters::default();
        let identity = build_principal(&jwt, "https://issuer", &params, None);
        assert_eq!(identity.find("sub"), Some("alice"));
        assert_eq!(identity.claims.iter().find(|c| c.claim_type == "sub").unwrap().issuer, "https://issuer");
    }

    #[test]
    fn name_claim_type_selects_name() {
        let mut claims = Map::new();
        claims.insert("sub".into(), Value::String("alice".into()));
        let jwt = signed_jwt(claims);
        let mut params = ValidationParameters::default();
        params.name_claim_type = "sub".to_string();
        let identity = build_principal(&jwt, "https://issuer", &params, None);
        assert_eq!(identity.name(), Some("alice"));
    }
}
