/*
 * Responsibility
 * - v1 entry point (re-exports routes())
 */
pub mod handlers;
mod routes;

pub use routes::routes;
