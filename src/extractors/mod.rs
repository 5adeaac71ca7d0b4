pub mod auth_ctx;

pub use auth_ctx::{BearerToken, VerifiedClaims, claims_from_context, token_from_context};
