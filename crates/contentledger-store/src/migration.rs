//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Key of the content id counter in `ledger_meta`.
pub const NEXT_CONTENT_ID_KEY: &str = "next_content_id";

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::debug!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Registered content; rows are never deleted
        CREATE TABLE contents (
            id INTEGER PRIMARY KEY,           -- sequential from 0
            creator TEXT NOT NULL,
            owner TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            content_hash TEXT NOT NULL,       -- opaque storage address
            price INTEGER NOT NULL,
            royalty_percentage INTEGER NOT NULL CHECK (royalty_percentage BETWEEN 0 AND 99),
            total_revenue INTEGER NOT NULL DEFAULT 0
        );

        -- One grant per (user, content); subscriptions expire lazily
        CREATE TABLE access_grants (
            user TEXT NOT NULL,
            content_id INTEGER NOT NULL REFERENCES contents(id),
            kind INTEGER NOT NULL,            -- 0=purchase, 1=subscription
            expires_at INTEGER,               -- NULL for purchases
            granted_at INTEGER NOT NULL,
            PRIMARY KEY (user, content_id)
        );

        -- Revenue records, kept equal to contents.total_revenue
        CREATE TABLE revenue (
            content_id INTEGER PRIMARY KEY REFERENCES contents(id),
            total_revenue INTEGER NOT NULL
        );

        -- Royalty settlement balances
        CREATE TABLE earnings (
            principal TEXT PRIMARY KEY,
            amount INTEGER NOT NULL
        );

        -- Counters
        CREATE TABLE ledger_meta (
            key TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        );

        INSERT INTO ledger_meta (key, value) VALUES ('next_content_id', 0);

        CREATE INDEX idx_contents_creator ON contents(creator);
        CREATE INDEX idx_access_grants_content ON access_grants(content_id);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
