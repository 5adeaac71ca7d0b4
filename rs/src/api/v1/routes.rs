/*
 * Responsibility
 * - v1 URL layout
 * - Every route here sits behind SSD token verification
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::whoami::whoami;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let router = Router::new().route("/whoami", get(whoami));
    ssd_jwt_auth::middleware::auth::apply(router, state.verifier)
}
