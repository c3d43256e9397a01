use axum::{
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};

/// `GET /health`: liveness probe.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}
