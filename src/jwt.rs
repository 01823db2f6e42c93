//! The parsed JWT value threaded through the validation pipeline (spec §4.7).

use crate::header::Header;
use crate::key::SecurityKey;
use crate::payload::Payload;

/// A structurally-decoded JWT. `signing_input` is retained verbatim from the
/// original compact string (spec invariant P6: the bytes passed to the signature
/// verifier are byte-identical to those present in the input string, never
/// re-serialized).
#[derive(Debug)]
pub struct Jwt {
    pub header: Header,
    pub payload: Payload,
    /// The exact ASCII bytes `header_b64 "." payload_b64`, as received.
    pub signing_input: Vec<u8>,
    /// The decoded signature bytes (empty for an unsigned token).
    pub signature: Vec<u8>,
    /// The original compact-serialized string, if this `Jwt` was produced by
    /// parsing one (absent for a freshly built, not-yet-serialized token).
    pub raw: Option<String>,
    /// The key that verified this token's signature, bound during validation
    /// (spec §4.7 step 3). `None` for an unsigned token or one not yet validated.
    pub signing_key: Option<SecurityKey>,
}

impl Jwt {
    pub(crate) fn new(
        header: Header,
        payload: Payload,
        signing_input: Vec<u8>,
        signature: Vec<u8>,
        raw: Option<String>,
    ) -> Self {
        Jwt {
            header,
            payload,
            signing_input,
            signature,
            raw,
            signing_key: None,
        }
    }
}
