//! Core data types for the level monitor and refund pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::monitor::rules::ResourceKey;

/// Typed view of a machine document at one point in time.
///
/// Fields absent from the source document are simply absent from the maps
/// and read back as `0` (an absent resource is an empty resource).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    /// Cup counts keyed by document field (`smallCups`, `largeCups`)
    pub inventory: BTreeMap<String, u64>,
    /// Volumes in ml keyed by document field (`liquid`)
    pub levels: BTreeMap<String, u64>,
}

/// Severity band of a threshold crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Early low-stock notice
    Warning,
    /// Resource exhausted, sales presumed halted
    Depleted,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "Warning",
            Severity::Depleted => "Depleted",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detected crossing. Produced per invocation and never stored by
/// the monitor itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub machine_id: String,
    pub resource: ResourceKey,
    /// Human-readable resource name, copied from the rule
    pub label: &'static str,
    pub severity: Severity,
    /// Compared quantity before the update (percent for capacity resources)
    pub before_value: f64,
    /// Compared quantity after the update (percent for capacity resources)
    pub after_value: f64,
    /// Raw reading after the update (count or ml)
    pub after_raw: u64,
    pub message: String,
}

/// A refund log entry after defaults have been applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundLogEntry {
    pub machine_id: String,
    pub date: String,
    pub log_id: String,
    pub error_code: String,
    pub cup_type: String,
    pub amount_tl: f64,
    pub amount_ml: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Outbound message handed to a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub subject: String,
    pub body: String,
    pub recipient: String,
}
