use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::types::{shared_claims, token_from_context};
use crate::error::AuthRejection;
use crate::services::auth::Claims;

/// Extractor for handlers behind the auth middleware.
/// Rejects with 401 when the middleware did not run for this route.
#[derive(Debug, Clone)]
pub struct VerifiedClaims(pub Arc<Claims>);

impl<S> FromRequestParts<S> for VerifiedClaims
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        shared_claims(&parts.extensions)
            .map(VerifiedClaims)
            .ok_or(AuthRejection)
    }
}

/// The raw token behind [`VerifiedClaims`], for forwarding to other services.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        token_from_context(&parts.extensions)
            .map(|token| BearerToken(token.to_string()))
            .ok_or(AuthRejection)
    }
}
