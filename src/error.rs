/*
 * Responsibility
 * - Error kinds for key provisioning and token verification
 * - The single 401 rejection returned to remote callers (reason is never disclosed)
 */
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Key material for one kid could not be parsed as an RSA public key.
///
/// Raised by construction and rotation. No partial key set is ever installed
/// when this is returned.
#[derive(Debug, Error)]
#[error("unable to parse pem for key id {kid}: {source}")]
pub struct KeyParseError {
    pub kid: String,
    #[source]
    pub source: KeyMaterialProblem,
}

/// What was wrong with one key's PEM.
#[derive(Debug, Error)]
pub enum KeyMaterialProblem {
    #[error("pem is not utf-8 text")]
    NotText,

    #[error("expected an `RSA PUBLIC KEY` or `PUBLIC KEY` block")]
    UnsupportedLabel,

    #[error("invalid pkcs#1 rsa public key: {0}")]
    Pkcs1(#[from] rsa::pkcs1::Error),

    #[error("invalid spki rsa public key: {0}")]
    Spki(#[from] rsa::pkcs8::spki::Error),
}

/// The token referenced a kid that is not in the installed key set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no such key {kid}")]
pub struct KeyNotFoundError {
    pub kid: String,
}

/// Why the header's `kid` could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyIdProblem {
    Absent,
    NotAString,
}

impl std::fmt::Display for KeyIdProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => write!(f, "no `kid` in header"),
            Self::NotAString => write!(f, "`kid` is not a string"),
        }
    }
}

/// Which claim check failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimsProblem {
    Missing(&'static str),
    Expired,
    NotYetValid,
    IssuedInFuture,
    WrongIssuer,
    WrongAudience,
    Invalid(String),
}

impl std::fmt::Display for ClaimsProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "missing '{}' claim", name),
            Self::Expired => write!(f, "token has expired"),
            Self::NotYetValid => write!(f, "token is not valid yet"),
            Self::IssuedInFuture => write!(f, "token used before issued"),
            Self::WrongIssuer => write!(f, "invalid issuer"),
            Self::WrongAudience => write!(f, "invalid audience"),
            Self::Invalid(detail) => write!(f, "invalid claims: {}", detail),
        }
    }
}

/// Classified token verification failure.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("signing algorithm {found:?} is not allowed")]
    AlgorithmMismatch { found: String },

    #[error("unusable key id: {0}")]
    MissingKeyId(KeyIdProblem),

    #[error(transparent)]
    KeyNotFound(#[from] KeyNotFoundError),

    #[error("signature is invalid")]
    SignatureInvalid,

    #[error("claims rejected: {0}")]
    ClaimsInvalid(ClaimsProblem),
}

impl VerifyError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedToken(detail.into())
    }

    /// Stable short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedToken(_) => "malformed_token",
            Self::AlgorithmMismatch { .. } => "algorithm_mismatch",
            Self::MissingKeyId(_) => "missing_key_id",
            Self::KeyNotFound(_) => "key_not_found",
            Self::SignatureInvalid => "signature_invalid",
            Self::ClaimsInvalid(_) => "claims_invalid",
        }
    }
}

/// Response sent whenever a request fails authentication.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthRejection;

pub const REJECTION_BODY: &str = "Unauthorized";

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            REJECTION_BODY,
        )
            .into_response()
    }
}

impl From<VerifyError> for AuthRejection {
    fn from(_: VerifyError) -> Self {
        AuthRejection
    }
}
