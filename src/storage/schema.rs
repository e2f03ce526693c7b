//! Database schema definitions.
//!
//! Every statement uses create-if-absent semantics so the same setup runs
//! against a fresh engine and against one hydrated from a snapshot.

use rusqlite::{Connection, Result};

/// The complete SQL schema for the projdash database.
///
/// Dates are stored as `YYYY-MM-DD` text so that lexical comparison matches
/// calendar order.
pub const SCHEMA_SQL: &str = r#"
-- Projects: one row per tracked project
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    owner TEXT,
    budget REAL,
    start_date TEXT,
    end_date TEXT,
    status TEXT NOT NULL DEFAULT 'active'
        CHECK (status IN ('active', 'paused', 'completed'))
);

CREATE INDEX IF NOT EXISTS idx_projects_status ON projects(status);
CREATE INDEX IF NOT EXISTS idx_projects_end_date ON projects(end_date);
"#;

/// Apply connection pragmas and the schema.
///
/// Safe to call any number of times on the same connection.
///
/// # Errors
///
/// Returns an error if a pragma or DDL statement fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    // The engine is in-memory, so WAL and synchronous settings do not apply
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;

    Ok(())
}
