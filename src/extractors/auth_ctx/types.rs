/*
 * Responsibility
 * - Request-scoped slots for the verified claims and the raw token
 * - The only read surface is the two accessors below
 */
use std::sync::Arc;

use axum::http::Extensions;

use crate::services::auth::Claims;

#[derive(Clone)]
struct ClaimsSlot(Arc<Claims>);

#[derive(Clone)]
struct TokenSlot(Arc<str>);

pub(crate) fn insert(extensions: &mut Extensions, claims: Claims, token: &str) {
    extensions.insert(ClaimsSlot(Arc::new(claims)));
    extensions.insert(TokenSlot(Arc::from(token)));
}

/// Claims placed by the auth middleware, if this request went through it.
pub fn claims_from_context(extensions: &Extensions) -> Option<&Claims> {
    extensions.get::<ClaimsSlot>().map(|slot| slot.0.as_ref())
}

/// The raw bearer token the claims were verified from.
pub fn token_from_context(extensions: &Extensions) -> Option<&str> {
    extensions.get::<TokenSlot>().map(|slot| slot.0.as_ref())
}

pub(super) fn shared_claims(extensions: &Extensions) -> Option<Arc<Claims>> {
    extensions.get::<ClaimsSlot>().map(|slot| Arc::clone(&slot.0))
}
