//! Refund event mapper

use crate::monitor::types::{NotificationMessage, RefundLogEntry};

/// Format one refund log entry as an operator notification.
///
/// Every entry yields exactly one message; defaults have already been applied
/// by [`normalize_refund`](crate::monitor::normalize::normalize_refund).
pub fn map_refund(entry: &RefundLogEntry, recipient: &str) -> NotificationMessage {
    let subject = format!("[{}] New refund recorded ({})", entry.machine_id, entry.error_code);

    let body = format!(
        "A new refund was processed:\n\
         - Machine: {}\n\
         - Date: {}\n\
         - Error code: {}\n\
         - Cup type: {}\n\
         - Amount: {} TL\n\
         - Volume: {} ml\n\
         - Log id: {}\n\
         - Processed at: {}\n",
        entry.machine_id,
        entry.date,
        entry.error_code,
        entry.cup_type,
        entry.amount_tl,
        entry.amount_ml,
        entry.log_id,
        entry.occurred_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );

    NotificationMessage {
        subject,
        body,
        recipient: recipient.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use crate::monitor::normalize::{normalize_refund, RefundKey};

    fn key() -> RefundKey {
        RefundKey {
            machine_id: "M-0001".to_string(),
            date: "2024-01-01".to_string(),
            log_id: "abc123".to_string(),
        }
    }

    #[test]
    fn message_carries_every_field_verbatim() {
        let raw = json!({
            "errorCode": "E1",
            "cupType": "large",
            "amountTl": 12.5,
            "amountMl": 250
        });
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
        let entry = normalize_refund(&key(), Some(&raw), at).unwrap();

        let message = map_refund(&entry, "ops@example.com");

        assert!(message.subject.contains("E1"));
        assert!(message.subject.contains("M-0001"));
        for value in ["M-0001", "2024-01-01", "E1", "large", "12.5", "250"] {
            assert!(message.body.contains(value), "body is missing {}", value);
        }
        assert!(message.body.contains("2024-01-01 09:30:00 UTC"));
        assert_eq!(message.recipient, "ops@example.com");
    }

    #[test]
    fn missing_error_code_is_reported_as_unknown() {
        let raw = json!({ "cupType": "small" });
        let entry = normalize_refund(&key(), Some(&raw), Utc::now()).unwrap();

        let message = map_refund(&entry, "ops@example.com");

        assert!(message.subject.contains("(unknown)"));
        assert!(message.body.contains("Error code: unknown"));
        assert!(message.body.contains("Amount: 0 TL"));
        assert!(message.body.contains("Volume: 0 ml"));
    }

    #[test]
    fn mapping_is_deterministic() {
        let raw = json!({ "errorCode": "E7", "amountTl": 3 });
        let at = Utc.with_ymd_and_hms(2024, 5, 5, 0, 0, 0).unwrap();
        let entry = normalize_refund(&key(), Some(&raw), at).unwrap();

        assert_eq!(map_refund(&entry, "a@b.c"), map_refund(&entry, "a@b.c"));
    }
}
