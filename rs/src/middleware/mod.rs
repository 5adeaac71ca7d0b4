/*
 * Responsibility
 * - Cross-cutting HTTP layers for the whole router
 * - Token verification lives in `ssd_jwt_auth::middleware::auth`
 */
pub mod http;
