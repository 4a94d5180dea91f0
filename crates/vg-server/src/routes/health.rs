//! Health check handler.

use axum::response::IntoResponse;

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    "ok"
}
