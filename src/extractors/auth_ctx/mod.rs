/*!
 * Authentication context
 *
 * Responsibility:
 * - Carry the verified claims and the raw token from the middleware to handlers
 * - Keys are private types, so nothing outside this module can collide with them
 *
 * Public API:
 * - claims_from_context / token_from_context
 * - VerifiedClaims / BearerToken extractors
 */

mod core;
mod types;

pub use self::core::{BearerToken, VerifiedClaims};
pub(crate) use self::types::insert;
pub use self::types::{claims_from_context, token_from_context};
