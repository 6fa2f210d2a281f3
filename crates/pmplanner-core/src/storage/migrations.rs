//! Database schema migrations for pmplanner.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);
    debug!(current_version, target = SCHEMA_VERSION, "checking schema");

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

/// Returns 0 if no version is set (initial database).
pub(crate) fn get_schema_version(conn: &Connection) -> i32 {
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

/// Migration v1: work items, definitions and the site calendar.
///
/// Timestamps are stored as `YYYY-MM-DDTHH:MM:SS` site-local text so that
/// range filters can compare them as strings.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS work_items (
            id             TEXT PRIMARY KEY,
            site_id        TEXT NOT NULL,
            definition_id  TEXT,
            description    TEXT NOT NULL,
            location_id    TEXT,
            element_id     TEXT,
            start_at       TEXT NOT NULL,
            end_at         TEXT NOT NULL,
            duration_hours INTEGER NOT NULL,
            workers        TEXT NOT NULL DEFAULT '[]',
            supervisor_id  TEXT,
            resource_plan  TEXT NOT NULL DEFAULT '{}',
            priority       TEXT NOT NULL DEFAULT 'medium',
            group_id       TEXT,
            group_index    INTEGER,
            group_total    INTEGER,
            period_year    INTEGER NOT NULL,
            period_month   INTEGER NOT NULL,
            state          TEXT NOT NULL DEFAULT 'DRAFT'
        );

        CREATE INDEX IF NOT EXISTS idx_work_items_period
            ON work_items(site_id, period_year, period_month, state);
        CREATE INDEX IF NOT EXISTS idx_work_items_start
            ON work_items(site_id, start_at);

        CREATE TABLE IF NOT EXISTS definitions (
            id      TEXT PRIMARY KEY,
            site_id TEXT NOT NULL,
            active  INTEGER NOT NULL DEFAULT 1,
            body    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS site_hours (
            site_id TEXT PRIMARY KEY,
            days    TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS holidays (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            site_id TEXT,
            date    TEXT NOT NULL,
            name    TEXT NOT NULL DEFAULT ''
        );",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: machine catalog and usage intervals.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS machines (
            id           TEXT PRIMARY KEY,
            company_id   TEXT NOT NULL,
            name         TEXT NOT NULL,
            machine_type TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS machine_usage (
            id            TEXT PRIMARY KEY,
            machine_id    TEXT NOT NULL,
            start_at      TEXT NOT NULL,
            end_at        TEXT,
            work_item_id  TEXT,
            plan_group_id TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_machine_usage_machine
            ON machine_usage(machine_id, start_at);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}
