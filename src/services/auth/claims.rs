//! Parsed token payload.
//!
//! Registered JWT claims plus the SSD section carried under `ssd.opsmx.io`.
//! Members this crate does not model are kept in [`Claims::extra`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SSD_CLAIMS_KEY: &str = "ssd.opsmx.io";

/// `aud` may be a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::Single(aud) => aud == audience,
            Self::Multiple(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Validated claims of one token.
///
/// Produced fresh by every successful verification. `kid` comes from the
/// token header, everything else from the signed payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "numeric_date")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "numeric_date")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "numeric_date")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    #[serde(rename = "ssd.opsmx.io", default, skip_serializing_if = "Option::is_none")]
    pub ssd: Option<SsdClaims>,

    #[serde(skip)]
    pub kid: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    pub fn token_type(&self) -> Option<TokenType> {
        self.ssd.as_ref().and_then(SsdClaims::token_type)
    }

    pub fn is_user(&self) -> bool {
        self.token_type() == Some(TokenType::User)
    }

    pub fn is_service(&self) -> bool {
        self.token_type() == Some(TokenType::Service)
    }

    pub fn is_internal(&self) -> bool {
        self.token_type() == Some(TokenType::Internal)
    }

    /// Username of a user token.
    pub fn username(&self) -> Option<&str> {
        self.ssd
            .as_ref()
            .and_then(|ssd| ssd.user.as_ref())
            .map(|user| user.username.as_str())
    }

    /// True only for user tokens that carry the admin flag.
    pub fn is_admin(&self) -> bool {
        self.ssd
            .as_ref()
            .and_then(|ssd| ssd.user.as_ref())
            .is_some_and(|user| user.is_admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    User,
    Service,
    Internal,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Service => "service",
            Self::Internal => "internal",
        }
    }
}

/// The `ssd.opsmx.io` section of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SsdClaims {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserClaims>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceClaims>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal: Option<InternalClaims>,
}

impl SsdClaims {
    /// `None` when `type` is not one of the known token types.
    pub fn token_type(&self) -> Option<TokenType> {
        match self.kind.as_str() {
            "user" => Some(TokenType::User),
            "service" => Some(TokenType::Service),
            "internal" => Some(TokenType::Internal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaims {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceClaims {
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub authorizations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InternalClaims {
    #[serde(default)]
    pub scopes: Vec<String>,
}

// JWT NumericDate: seconds since the epoch, integer or fractional.
mod numeric_date {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_i64(*ts),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
            return Ok(None);
        };
        if let Some(ts) = number.as_i64() {
            return Ok(Some(ts));
        }
        match number.as_f64() {
            Some(ts) if ts.is_finite() => Ok(Some(ts.trunc() as i64)),
            _ => Err(D::Error::custom("numeric date out of range")),
        }
    }
}
