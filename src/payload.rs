//! Typed view over the JWT claims-set JSON object (spec §3).
//!
//! Like `Header`, this wraps a `serde_json::Map` rather than a fixed struct so
//! caller-chosen key order and unrecognized claims survive round-trip untouched;
//! reserved claims are read through accessors.

use serde_json::{Map, Value};

use crate::error::JwtError;

/// A set of JWT claims.
#[derive(Clone, Debug, Default)]
pub struct Payload(Map<String, Value>);

/// NumericDate: seconds since the Unix epoch. Fractional seconds are accepted on
/// input (truncated) but this crate always produces an integer on output.
pub type NumericDate = i64;

impl Payload {
    pub fn new() -> Self {
        Payload(Map::new())
    }

    pub(crate) fn from_map(map: Map<String, Value>) -> Self {
        Payload(map)
    }

    pub(crate) fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub(crate) fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn set_claim(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn iss(&self) -> Option<&str> {
        self.0.get("iss").and_then(Value::as_str)
    }

    pub fn set_iss(&mut self, iss: impl Into<String>) {
        self.0.insert("iss".into(), Value::String(iss.into()));
    }

    pub fn sub(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    pub fn jti(&self) -> Option<&str> {
        self.0.get("jti").and_then(Value::as_str)
    }

    /// The audience set, normalizing a single-string `aud` to a one-element set,
    /// per spec §4.7 step 5.
    pub fn aud_set(&self) -> Vec<String> {
        match self.0.get("aud") {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_aud(&mut self, audiences: &[String]) {
        match audiences {
            [] => {}
            [single] => {
                self.0.insert("aud".into(), Value::String(single.clone()));
            }
            many => {
                self.0.insert(
                    "aud".into(),
                    Value::Array(many.iter().cloned().map(Value::String).collect()),
                );
            }
        }
    }

    pub fn exp(&self) -> Result<Option<NumericDate>, JwtError> {
        numeric_date(self.0.get("exp"))
    }

    pub fn set_exp(&mut self, exp: NumericDate) {
        self.0.insert("exp".into(), Value::from(exp));
    }

    pub fn nbf(&self) -> Result<Option<NumericDate>, JwtError> {
        numeric_date(self.0.get("nbf"))
    }

    pub fn set_nbf(&mut self, nbf: NumericDate) {
        self.0.insert("nbf".into(), Value::from(nbf));
    }

    pub fn iat(&self) -> Result<Option<NumericDate>, JwtError> {
        numeric_date(self.0.get("iat"))
    }

    pub fn set_iat(&mut self, iat: NumericDate) {
        self.0.insert("iat".into(), Value::from(iat));
    }

    /// The `actort` claim: a nested compact JWT representing delegated identity.
    pub fn actort(&self) -> Option<&str> {
        self.0.get("actort").and_then(Value::as_str)
    }

    pub fn set_actort(&mut self, actort: impl Into<String>) {
        self.0.insert("actort".into(), Value::String(actort.into()));
    }
}

fn numeric_date(value: Option<&Value>) -> Result<Option<NumericDate>, JwtError> {
    match value {
        None => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Some(f.trunc() as NumericDate))
            } else {
                Err(JwtError::MalformedToken("NumericDate out of range".into()))
            }
        }
        Some(_) => Err(JwtError::MalformedToken("NumericDate must be numeric".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aud_normalizes_single_string() {
        let mut payload = Payload::new();
        payload.set_claim("aud", Value::String("api".into()));
        assert_eq!(payload.aud_set(), vec!["api".to_string()]);
    }

    #[test]
    fn aud_reads_array() {
        let mut payload = Payload::new();
        payload.set_claim(
            "aud",
            Value::Array(vec![Value::String("a".into()), Value::String("b".into())]),
        );
        assert_eq!(payload.aud_set(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn numeric_date_accepts_fractional_input() {
        let mut payload = Payload::new();
        payload.set_claim("exp", Value::from(1700000000.7));
        assert_eq!(payload.exp().unwrap(), Some(1700000000));
    }

    #[test]
    fn set_exp_produces_integer() {
        let mut payload = Payload::new();
        payload.set_exp(1700000000);
        assert!(matches!(payload.claim("exp"), Some(Value::Number(_))));
    }
}
