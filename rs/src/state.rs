/*
 * Responsibility
 * - Shared router state (AppState); cheap to clone
 */
use std::sync::Arc;

use ssd_jwt_auth::Verifier;

#[derive(Clone, Debug)]
pub struct AppState {
    pub verifier: Arc<Verifier>,
}

impl AppState {
    pub fn new(verifier: Arc<Verifier>) -> Self {
        Self { verifier }
    }
}
