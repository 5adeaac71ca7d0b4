//! Shared fixtures for integration tests: RSA keys, a fixed clock and token minting.
#![allow(dead_code, clippy::expect_used)]

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use ssd_jwt_auth::{Clock, VerificationPolicy, Verifier};

pub const K1_PRIVATE: &[u8] = include_bytes!("../fixtures/k1_private.pem");
pub const K1_PUBLIC: &[u8] = include_bytes!("../fixtures/k1_public.pem");
pub const K2_PRIVATE: &[u8] = include_bytes!("../fixtures/k2_private.pem");
pub const K2_PUBLIC: &[u8] = include_bytes!("../fixtures/k2_public.pem");

/// Seconds since the epoch reported by the test clock.
pub const NOW: i64 = 1_700_000_000;

pub fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(NOW, 0).single().expect("valid timestamp")
}

pub fn policy() -> VerificationPolicy {
    VerificationPolicy::default().with_clock(Clock::fixed(now()))
}

/// Verifier with `k1` installed.
pub fn verifier() -> Verifier {
    Verifier::new([("k1", K1_PUBLIC)], policy()).expect("fixture keys parse")
}

/// A user-token payload valid at [`NOW`].
pub fn user_payload() -> Value {
    json!({
        "iss": "OpsMx",
        "aud": "ssd.opsmx.io",
        "sub": "alice",
        "exp": NOW + 600,
        "iat": NOW - 60,
        "jti": "token-1",
        "ssd.opsmx.io": {
            "type": "user",
            "user": {
                "username": "alice",
                "orgId": "org-1",
                "groups": ["dev", "ops"],
                "isAdmin": false
            }
        }
    })
}

/// `user_payload()` with `field` replaced (or removed when `value` is null).
pub fn payload_with(field: &str, value: Value) -> Value {
    let mut payload = user_payload();
    let map = payload.as_object_mut().expect("object payload");
    if value.is_null() {
        map.remove(field);
    } else {
        map.insert(field.to_string(), value);
    }
    payload
}

pub fn sign(alg: Algorithm, kid: Option<&str>, private_pem: &[u8], payload: &Value) -> String {
    let mut header = Header::new(alg);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(private_pem).expect("rsa private key");
    jsonwebtoken::encode(&header, payload, &key).expect("sign test token")
}

/// PS256 token signed with k1's private key.
pub fn k1_token(payload: &Value) -> String {
    sign(Algorithm::PS256, Some("k1"), K1_PRIVATE, payload)
}

/// PS256 token signed with k2's private key.
pub fn k2_token(payload: &Value) -> String {
    sign(Algorithm::PS256, Some("k2"), K2_PRIVATE, payload)
}

/// Raw JWT from header and payload JSON with a junk signature.
pub fn craft_raw_jwt(header: &Value, payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header).expect("header json"));
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).expect("payload json"));
    format!("{header}.{payload}.c2lnbmF0dXJl")
}
