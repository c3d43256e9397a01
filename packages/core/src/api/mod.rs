//! HTTP surface: trigger endpoints, delivery history, health and metrics.

pub mod health;
pub mod notifications;
pub mod triggers;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::metrics::AppMetrics;
use crate::pipeline::Pipeline;
use crate::repository::NotificationRepository;

/// Assemble the full application router.
pub fn create_router(
    pipeline: Arc<Pipeline>,
    repository: Arc<NotificationRepository>,
    metrics: Arc<AppMetrics>,
) -> Router {
    let triggers = Router::new()
        .route("/machines/:machine_id/levels", post(triggers::level_changed))
        .route(
            "/machines/:machine_id/refunds/:date/:log_id",
            post(triggers::refund_created),
        )
        .with_state(pipeline);

    let history = Router::new()
        .route("/notifications/history", get(notifications::get_history))
        .with_state(repository);

    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(render_metrics).with_state(metrics))
        .merge(triggers)
        .merge(history)
        .layer(TraceLayer::new_for_http())
}

async fn render_metrics(State(metrics): State<Arc<AppMetrics>>) -> Response {
    match metrics.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
            .body(Body::from(body))
            .unwrap_or_default(),
        Err(err) => {
            tracing::error!("Failed to render metrics: {}", err);
            let mut response = Response::new(Body::from("metrics error"));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}
