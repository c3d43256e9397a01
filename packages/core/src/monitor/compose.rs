//! Alert message composition

use crate::monitor::types::{AlertEvent, NotificationMessage, Severity};

/// Build the operator notification for a detected crossing.
pub fn compose_alert(event: &AlertEvent, recipient: &str) -> NotificationMessage {
    let subject = match event.severity {
        Severity::Warning => format!("[{}] {} is running low", event.machine_id, event.label),
        Severity::Depleted => format!(
            "[{}] {} depleted - sales halted",
            event.machine_id, event.label
        ),
    };

    NotificationMessage {
        subject,
        body: format!("Machine: {}\n{}\n", event.machine_id, event.message),
        recipient: recipient.to_string(),
    }
}
