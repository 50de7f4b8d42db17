use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "rate_limit_enabled": state.application_service.limiter().is_enabled(),
    });
    (StatusCode::OK, Json(body))
}
