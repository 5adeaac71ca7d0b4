/*
 * Responsibility
 * - GET /health (public; reports how many verification keys are installed)
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let keys = state.verifier.key_ids().len();
    (StatusCode::OK, Json(json!({"status": "ok", "keys": keys})))
}
