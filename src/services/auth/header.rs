//! Untrusted view of a token's JOSE header.
//!
//! Decoded before anything is verified, only to pick the key and reject
//! disallowed algorithms early. Accessors are typed so that "missing" and
//! "wrong type" stay distinguishable.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value};

use crate::error::{KeyIdProblem, VerifyError};

#[derive(Debug, Clone)]
pub struct TokenHeader {
    fields: Map<String, Value>,
}

impl TokenHeader {
    /// Split the compact serialization and decode its first segment.
    pub fn decode(token: &str) -> Result<Self, VerifyError> {
        if token.is_empty() {
            return Err(VerifyError::malformed("empty token"));
        }

        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(VerifyError::malformed(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        }

        let raw = URL_SAFE_NO_PAD
            .decode(segments[0])
            .map_err(|e| VerifyError::malformed(format!("header is not base64url: {}", e)))?;

        let fields = match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => return Err(VerifyError::malformed("header is not a JSON object")),
            Err(e) => return Err(VerifyError::malformed(format!("header is not JSON: {}", e))),
        };

        Ok(Self { fields })
    }

    /// The declared `alg`, if it is a string.
    pub fn algorithm(&self) -> Option<&str> {
        self.fields.get("alg").and_then(Value::as_str)
    }

    pub fn key_id(&self) -> Result<&str, KeyIdProblem> {
        match self.fields.get("kid") {
            None | Some(Value::Null) => Err(KeyIdProblem::Absent),
            Some(Value::String(kid)) => Ok(kid),
            Some(_) => Err(KeyIdProblem::NotAString),
        }
    }
}
