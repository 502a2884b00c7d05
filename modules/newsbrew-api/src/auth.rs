use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

use crate::AppState;

/// Reject requests without a valid `X-API-KEY` header. Applied to
/// every `/api` route; the health check stays open.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(key) = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
    else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "No API key provided"})),
        )
            .into_response();
    };

    if !constant_time_eq(key.as_bytes(), state.api_key.as_bytes()) {
        let prefix: String = key.chars().take(10).collect();
        warn!(key_prefix = %prefix, "Rejected request with invalid API key");
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"error": "Forbidden - Invalid API Key"})),
        )
            .into_response();
    }

    next.run(request).await
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
