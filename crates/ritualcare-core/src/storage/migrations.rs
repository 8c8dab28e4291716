//! Database schema migrations for ritualcare.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::warn;

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: calendar events table.
///
/// `status` holds the status kind for filtering; `status_detail` holds the
/// full tagged status as JSON.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS calendar_events (
            id                            TEXT PRIMARY KEY,
            user_id                       TEXT NOT NULL,
            category                      TEXT NOT NULL,
            activity_type                 TEXT NOT NULL,
            title                         TEXT NOT NULL,
            description                   TEXT,
            start_time                    TEXT NOT NULL,
            end_time                      TEXT NOT NULL,
            load_level                    TEXT NOT NULL,
            requires_rest_buffer          INTEGER NOT NULL DEFAULT 0,
            recommended_rest_hours_after  INTEGER NOT NULL DEFAULT 0,
            status                        TEXT NOT NULL DEFAULT 'PLANNED',
            status_detail                 TEXT NOT NULL,
            ritual_id                     TEXT,
            booking_id                    TEXT,
            parent_event_id               TEXT,
            created_at                    TEXT NOT NULL,
            updated_at                    TEXT NOT NULL
        );",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: indexes for the per-user window and status queries.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_events_user_start ON calendar_events(user_id, start_time);
         CREATE INDEX IF NOT EXISTS idx_events_user_status ON calendar_events(user_id, status);
         CREATE INDEX IF NOT EXISTS idx_events_parent ON calendar_events(parent_event_id);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}
