//! Delivery log persistence.
//!
//! Every dispatch attempt made by the pipeline, delivered or not, is written
//! here via [`NotificationRepository::log_delivery`]. The log is write-only
//! from the pipeline's point of view; alerting decisions never read it.

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

/// Trigger kinds recorded in the delivery log.
pub const VALID_KINDS: &[&str] = &["level", "refund"];

/// A single delivery attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: Option<i64>,
    pub machine_id: String,
    /// "level" or "refund"
    pub kind: String,
    /// Alert severity for level notifications, `None` for refunds
    pub severity: Option<String>,
    pub subject: String,
    pub recipient: String,
    pub channel: String,
    pub delivered: bool,
    pub error: Option<String>,
    pub attempted_at: String,
}

/// Optional filters for history queries.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter<'a> {
    pub kind: Option<&'a str>,
    pub machine_id: Option<&'a str>,
    pub delivered: Option<bool>,
}

impl HistoryFilter<'_> {
    fn where_clause(&self) -> String {
        let mut conditions = vec!["1=1"];
        if self.kind.is_some() {
            conditions.push("kind = ?");
        }
        if self.machine_id.is_some() {
            conditions.push("machine_id = ?");
        }
        if self.delivered.is_some() {
            conditions.push("delivered = ?");
        }
        conditions.join(" AND ")
    }

    fn bind<'q>(
        &self,
        mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        if let Some(kind) = self.kind {
            query = query.bind(kind.to_string());
        }
        if let Some(machine_id) = self.machine_id {
            query = query.bind(machine_id.to_string());
        }
        if let Some(delivered) = self.delivered {
            query = query.bind(if delivered { 1i64 } else { 0i64 });
        }
        query
    }
}

/// Repository for the notification delivery log.
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record one delivery attempt. Returns the new row id.
    pub async fn log_delivery(&self, record: &DeliveryRecord) -> Result<i64, sqlx::Error> {
        let delivered_int: i64 = if record.delivered { 1 } else { 0 };

        let result = sqlx::query(
            "INSERT INTO delivery_log
             (machine_id, kind, severity, subject, recipient, channel, delivered, error, attempted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.machine_id)
        .bind(&record.kind)
        .bind(&record.severity)
        .bind(&record.subject)
        .bind(&record.recipient)
        .bind(&record.channel)
        .bind(delivered_int)
        .bind(&record.error)
        .bind(&record.attempted_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent attempts first. `limit` is clamped to 1..=100.
    pub async fn query_history(
        &self,
        limit: i64,
        filter: &HistoryFilter<'_>,
    ) -> Result<Vec<DeliveryRecord>, sqlx::Error> {
        let limit = limit.clamp(1, 100);

        let sql = format!(
            "SELECT id, machine_id, kind, severity, subject, recipient, channel, delivered, error, attempted_at
             FROM delivery_log
             WHERE {}
             ORDER BY attempted_at DESC, id DESC
             LIMIT ?",
            filter.where_clause()
        );

        let rows = filter
            .bind(sqlx::query(&sql))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .into_iter()
            .filter_map(|row| {
                let delivered: i64 = row.try_get("delivered").ok()?;
                Some(DeliveryRecord {
                    id: Some(row.try_get("id").ok()?),
                    machine_id: row.try_get("machine_id").ok()?,
                    kind: row.try_get("kind").ok()?,
                    severity: row.try_get("severity").ok()?,
                    subject: row.try_get("subject").ok()?,
                    recipient: row.try_get("recipient").ok()?,
                    channel: row.try_get("channel").ok()?,
                    delivered: delivered != 0,
                    error: row.try_get("error").ok()?,
                    attempted_at: row.try_get("attempted_at").ok()?,
                })
            })
            .collect();

        Ok(records)
    }

    /// Count attempts matching `filter` (for pagination totals).
    pub async fn count_deliveries(&self, filter: &HistoryFilter<'_>) -> Result<i64, sqlx::Error> {
        let sql = format!(
            "SELECT COUNT(*) as cnt FROM delivery_log WHERE {}",
            filter.where_clause()
        );

        let row = filter.bind(sqlx::query(&sql)).fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("cnt").unwrap_or(0);
        Ok(count)
    }
}
