//! SQLite connection pool and schema.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS delivery_log (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        machine_id   TEXT    NOT NULL,
        kind         TEXT    NOT NULL,
        severity     TEXT,
        subject      TEXT    NOT NULL,
        recipient    TEXT    NOT NULL,
        channel      TEXT    NOT NULL,
        delivered    INTEGER NOT NULL,
        error        TEXT,
        attempted_at TEXT    NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_delivery_log_attempted_at ON delivery_log (attempted_at)",
    "CREATE INDEX IF NOT EXISTS idx_delivery_log_machine ON delivery_log (machine_id)",
];

/// Open (creating if needed) the database at `database_url` and apply the
/// schema. In-memory databases are pinned to a single connection so every
/// query sees the same data.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options.connect_with(options).await?;

    for statement in SCHEMA {
        sqlx::query(statement).execute(&pool).await?;
    }

    tracing::debug!("Database ready at {}", database_url);
    Ok(pool)
}
