//! Raw record normalization
//!
//! Trigger payloads arrive as untyped JSON documents. This is the only place
//! that looks at that untrusted shape: everything downstream works on
//! [`MachineSnapshot`] and [`RefundLogEntry`] with every default applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::monitor::{
    error::MonitorError,
    types::{MachineSnapshot, RefundLogEntry},
};

pub const DEFAULT_ERROR_CODE: &str = "unknown";
pub const DEFAULT_CUP_TYPE: &str = "none";

/// Address of a refund log document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundKey {
    pub machine_id: String,
    /// Partition key, e.g. "2024-01-01"
    pub date: String,
    pub log_id: String,
}

/// Build a [`MachineSnapshot`] from a raw machine document.
///
/// `label` names the snapshot ("before" / "after") in error messages.
/// Absent `inventory` / `levels` containers are valid and read as empty.
pub fn normalize_snapshot(
    raw: Option<&Value>,
    label: &str,
) -> Result<MachineSnapshot, MonitorError> {
    let document = require_document(raw, &format!("{} snapshot", label))?;

    Ok(MachineSnapshot {
        inventory: read_counts(document.get("inventory")),
        levels: read_counts(document.get("levels")),
    })
}

/// Build a [`RefundLogEntry`] from a raw refund log document.
///
/// `now` becomes the entry's processing timestamp.
pub fn normalize_refund(
    key: &RefundKey,
    raw: Option<&Value>,
    now: DateTime<Utc>,
) -> Result<RefundLogEntry, MonitorError> {
    let document = require_document(raw, "refund record")?;

    Ok(RefundLogEntry {
        machine_id: key.machine_id.clone(),
        date: key.date.clone(),
        log_id: key.log_id.clone(),
        error_code: read_text(document.get("errorCode"))
            .unwrap_or_else(|| DEFAULT_ERROR_CODE.to_string()),
        cup_type: read_text(document.get("cupType"))
            .unwrap_or_else(|| DEFAULT_CUP_TYPE.to_string()),
        amount_tl: document.get("amountTl").and_then(read_decimal).unwrap_or(0.0),
        amount_ml: document.get("amountMl").and_then(read_count).unwrap_or(0),
        occurred_at: now,
    })
}

/// Absent, `null` and `{}` are missing data; any other non-object is malformed.
fn require_document<'a>(
    raw: Option<&'a Value>,
    what: &str,
) -> Result<&'a Map<String, Value>, MonitorError> {
    match raw {
        None | Some(Value::Null) => Err(MonitorError::missing_data(format!("{} is absent", what))),
        Some(Value::Object(map)) if map.is_empty() => {
            Err(MonitorError::missing_data(format!("{} is empty", what)))
        }
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(MonitorError::malformed_record(format!(
            "{} must be an object, got {}",
            what,
            json_kind(other)
        ))),
    }
}

fn read_counts(container: Option<&Value>) -> BTreeMap<String, u64> {
    match container {
        Some(Value::Object(fields)) => fields
            .iter()
            .filter_map(|(name, value)| read_count(value).map(|count| (name.clone(), count)))
            .collect(),
        Some(Value::Null) | None => BTreeMap::new(),
        Some(other) => {
            tracing::debug!("Ignoring non-object container ({})", json_kind(other));
            BTreeMap::new()
        }
    }
}

/// Non-negative integer reading. Fractions are truncated, negatives clamp to
/// zero, numeric strings are accepted, anything else is treated as missing.
fn read_count(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    read_decimal(value).map(|n| if n <= 0.0 { 0 } else { n.trunc() as u64 })
}

fn read_decimal(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Non-blank text. Numbers are rendered, blank strings count as missing.
fn read_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
