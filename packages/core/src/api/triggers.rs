//! Trigger endpoints.
//!
//! Routes:
//! - `POST /machines/:machine_id/levels`                   : machine document changed
//! - `POST /machines/:machine_id/refunds/:date/:log_id`    : refund log entry created
//!
//! Both answer `200` with a [`PipelineOutcome`] whenever the core ran, even if
//! some deliveries failed, and `422` when the payload is missing or malformed.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::monitor::{MonitorError, RefundKey};
use crate::pipeline::{Pipeline, PipelineOutcome};

/// Shared state for the trigger routes.
pub type TriggersState = Arc<Pipeline>;

type TriggerResult = Result<Json<PipelineOutcome>, (StatusCode, Json<Value>)>;

/// Body of a level trigger: the machine document before and after the change.
#[derive(Debug, Default)]
pub struct LevelChangeRequest {
    pub before: Option<Value>,
    pub after: Option<Value>,
}

impl LevelChangeRequest {
    /// Split a parsed body into its two snapshots. An absent or `null` body
    /// yields neither, leaving the missing-data decision to the pipeline.
    fn from_document(document: Option<Value>) -> Result<Self, MonitorError> {
        match document {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::Object(mut fields)) => Ok(Self {
                before: fields.remove("before"),
                after: fields.remove("after"),
            }),
            Some(_) => Err(MonitorError::malformed_record(
                "level trigger body must be an object with before and after",
            )),
        }
    }
}

fn rejected(err: MonitorError) -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({
            "error": err.to_string(),
            "reason": err.reason(),
        })),
    )
}

/// Parse a raw request body. Empty or whitespace-only bodies are `None`.
fn parse_body(body: &Bytes) -> Result<Option<Value>, MonitorError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<Value>(body)
        .map(Some)
        .map_err(|err| MonitorError::malformed_record(format!("invalid JSON: {}", err)))
}

/// `POST /machines/:machine_id/levels`
///
/// Read from raw bytes so that empty or unparseable bodies, with or without
/// a JSON content type, are answered with `422` like any other bad payload.
pub async fn level_changed(
    State(pipeline): State<TriggersState>,
    Path(machine_id): Path<String>,
    body: Bytes,
) -> TriggerResult {
    let request = parse_body(&body)
        .and_then(LevelChangeRequest::from_document)
        .map_err(|err| rejected(pipeline.reject_unreadable("level", &machine_id, err)))?;

    pipeline
        .process_level_change(&machine_id, request.before.as_ref(), request.after.as_ref())
        .await
        .map(Json)
        .map_err(rejected)
}

/// `POST /machines/:machine_id/refunds/:date/:log_id`
///
/// The body is the raw refund document. An empty body counts as a missing
/// record rather than a bad request.
pub async fn refund_created(
    State(pipeline): State<TriggersState>,
    Path((machine_id, date, log_id)): Path<(String, String, String)>,
    body: Bytes,
) -> TriggerResult {
    let record = parse_body(&body)
        .map_err(|err| rejected(pipeline.reject_unreadable("refund", &machine_id, err)))?;

    let key = RefundKey {
        machine_id,
        date,
        log_id,
    };

    pipeline
        .process_refund(&key, record.as_ref())
        .await
        .map(Json)
        .map_err(rejected)
}
