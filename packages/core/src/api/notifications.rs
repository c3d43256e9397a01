//! Delivery history endpoint.
//!
//! - `GET /notifications/history` : paginated delivery log

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::repository::{DeliveryRecord, HistoryFilter, NotificationRepository, VALID_KINDS};

/// Shared state for the history route.
pub type HistoryState = Arc<NotificationRepository>;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub kind: Option<String>,
    pub machine_id: Option<String>,
    pub delivered: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub total: i64,
    pub items: Vec<DeliveryRecord>,
}

/// `GET /notifications/history`
///
/// Query params:
/// - `limit`      : max items to return (default 20, clamped to 100)
/// - `kind`       : optional filter: level | refund
/// - `machine_id` : optional filter
/// - `delivered`  : optional bool filter
pub async fn get_history(
    State(repo): State<HistoryState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<serde_json::Value>)> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    if let Some(kind) = params.kind.as_deref() {
        if !VALID_KINDS.contains(&kind) {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": format!(
                        "Invalid kind '{}'. Must be one of: {}",
                        kind,
                        VALID_KINDS.join(", ")
                    )
                })),
            ));
        }
    }

    let filter = HistoryFilter {
        kind: params.kind.as_deref(),
        machine_id: params.machine_id.as_deref(),
        delivered: params.delivered,
    };

    let (items, total) = tokio::try_join!(
        repo.query_history(limit, &filter),
        repo.count_deliveries(&filter),
    )
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
    })?;

    Ok(Json(HistoryResponse { total, items }))
}
