/*
 * Responsibility
 * - Public middleware surface (re-exports)
 * - auth::access: bearer token verification for protected routes
 */
pub mod auth;
