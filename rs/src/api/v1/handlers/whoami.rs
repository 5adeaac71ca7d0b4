/*
 * Responsibility
 * - GET /api/v1/whoami (protected)
 * - Echo the identity the auth middleware verified
 */
use axum::{Json, response::IntoResponse};
use serde_json::json;
use ssd_jwt_auth::VerifiedClaims;

pub async fn whoami(VerifiedClaims(claims): VerifiedClaims) -> impl IntoResponse {
    Json(json!({
        "sub": claims.sub,
        "type": claims.token_type().map(|t| t.as_str()),
        "username": claims.username(),
        "admin": claims.is_admin(),
        "kid": claims.kid,
        "expires_at": claims.expires_at().map(|t| t.to_rfc3339()),
    }))
}
