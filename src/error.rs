//! Error taxonomy for the JWT core. Every pipeline step (see `crate::validator`)
//! fails with exactly one of these categories so callers can branch on the kind of
//! failure rather than parsing message text.

use thiserror::Error;

/// A structured, categorized failure from any operation in this crate.
///
/// Diagnostic text accumulates across attempted keys during signature verification
/// but never includes raw key bytes — only key identifiers and algorithm names.
#[derive(Error, Debug)]
pub enum JwtError {
    /// A required argument was null, empty, or all-whitespace.
    #[error("required argument missing: {0}")]
    ArgumentMissing(String),

    /// The raw token exceeded the configured size cap.
    #[error("token of {actual} bytes exceeds the {limit}-byte cap")]
    TokenTooLarge {
        /// Observed length in bytes.
        actual: usize,
        /// Configured `max_token_size_bytes`.
        limit: usize,
    },

    /// Structural, JSON, or base64 decoding failure.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The provider factory could not produce a provider for `(key, alg)`.
    #[error("unsupported algorithm {alg:?} for the presented key")]
    UnsupportedAlgorithm {
        /// The wire or internal algorithm name that could not be resolved.
        alg: String,
    },

    /// An unsigned token was presented while `require_signed_tokens` was set.
    #[error("signature required but token is unsigned")]
    SignatureRequired,

    /// No candidate key verified the signature, and none matched the header's `kid`.
    #[error("signature invalid against all {attempted} candidate key(s): {diagnostics}")]
    InvalidSignature {
        /// Number of candidate keys attempted.
        attempted: usize,
        /// Accumulated per-key diagnostic text.
        diagnostics: String,
    },

    /// At least one candidate key matched the header's key identifier, but none
    /// verified. Distinct from `InvalidSignature`: this is the signal callers use to
    /// trigger a key-set refresh and retry.
    #[error("no matched key verified the signature; key set may be stale: {diagnostics}")]
    SigningKeyNotFound {
        /// Accumulated per-key diagnostic text for the matched candidates.
        diagnostics: String,
        /// The first underlying error captured while attempting a matched
        /// candidate (e.g. an unsupported algorithm), so callers can branch on it
        /// programmatically instead of parsing `diagnostics`. `None` when every
        /// matched candidate failed by plain signature mismatch rather than error.
        first_cause: Option<Box<JwtError>>,
    },

    /// `require_expiration_time` was set but the payload carries no `exp`.
    #[error("token carries no expiration time")]
    NoExpiration,

    /// `nbf` is in the future, even after applying clock skew.
    #[error("token is not yet valid")]
    NotYetValid,

    /// `exp` is in the past, even after applying clock skew.
    #[error("token has expired")]
    Expired,

    /// The token's audience set does not intersect the allowed set.
    #[error("audience not accepted")]
    InvalidAudience,

    /// The token's issuer is not in the allowed set.
    #[error("issuer not accepted")]
    InvalidIssuer,

    /// Nested actor-token validation failed.
    #[error("actor token validation failed")]
    InvalidActor(#[source] Box<JwtError>),

    /// Actor nesting exceeded `max_actor_depth`.
    #[error("actor recursion depth exceeded")]
    ActorDepthExceeded,

    /// The certificate/key policy rejected the bound signing key.
    #[error("signing key rejected by certificate/key policy")]
    InvalidSigningKey,
}

impl From<serde_json::Error> for JwtError {
    fn from(err: serde_json::Error) -> Self {
        JwtError::MalformedToken(err.to_string())
    }
}

impl From<openssl::error::ErrorStack> for JwtError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        JwtError::MalformedToken(format!("openssl operation failed: {err}"))
    }
}
