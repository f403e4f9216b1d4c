//! Database schema migrations for cycletrack.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

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

/// Create the schema_version table if it doesn't exist.
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
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: observation log.
///
/// One row per calendar day; sensation and mucus are stored as JSON arrays
/// of tags.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS observations (
            date            TEXT PRIMARY KEY,
            bleeding_level  TEXT NOT NULL DEFAULT 'none',
            sensation       TEXT NOT NULL DEFAULT '[]',
            mucus           TEXT NOT NULL DEFAULT '[]',
            had_intercourse INTEGER NOT NULL DEFAULT 0,
            note            TEXT
        );",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()?;
    tracing::debug!("applied schema migration v1");
    Ok(())
}

/// Migration v2: forecast windows and corrections.
///
/// Both tables are keyed by (date, kind) so that saving a recomputed
/// forecast replaces rows instead of duplicating them.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS forecasts (
            start_date   TEXT NOT NULL,
            kind         TEXT NOT NULL,
            end_date     TEXT NOT NULL,
            confidence   REAL NOT NULL,
            generated_on TEXT NOT NULL,
            PRIMARY KEY (start_date, kind)
        );

        CREATE TABLE IF NOT EXISTS corrections (
            date                    TEXT NOT NULL,
            kind                    TEXT NOT NULL,
            original_predicted_date TEXT NOT NULL,
            actual_date             TEXT NOT NULL,
            days                    INTEGER NOT NULL,
            PRIMARY KEY (date, kind)
        );

        CREATE INDEX IF NOT EXISTS idx_forecasts_kind ON forecasts(kind);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()?;
    tracing::debug!("applied schema migration v2");
    Ok(())
}
