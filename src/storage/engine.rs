//! The embedded engine: one in-memory SQLite connection.
//!
//! The connection sits behind a mutex so that every statement and every
//! snapshot runs on a single logical thread of control. Each primitive holds
//! the lock for exactly one statement.

use crate::error::{Error, Result};
use crate::storage::row::{Row, RunResult};
use crate::storage::schema::apply_schema;
use parking_lot::Mutex;
use rusqlite::backup::Progress;
use rusqlite::types::Value;
use rusqlite::{Connection, DatabaseName, Params};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, trace};

/// The loaded, initialized engine instance.
pub(crate) struct Engine {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine {
    /// Open a fresh in-memory engine, hydrate it from `snapshot` if given,
    /// then apply the schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Initialization`] if the engine cannot be opened, the
    /// snapshot is empty or not a valid database image, or schema setup
    /// fails.
    pub(crate) fn open(snapshot: Option<&[u8]>) -> Result<Self> {
        let mut conn = Connection::open_in_memory()
            .map_err(|e| Error::Initialization(format!("cannot open engine: {e}")))?;

        if let Some(bytes) = snapshot {
            hydrate(&mut conn, bytes)?;
        }

        apply_schema(&conn)
            .map_err(|e| Error::Initialization(format!("schema setup failed: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// First row of the result, or `None` when the query matches nothing.
    pub(crate) fn get<P: Params>(&self, sql: &str, params: P) -> Result<Option<Row>> {
        Ok(self.query(sql, params, Some(1))?.into_iter().next())
    }

    /// All rows of the result in engine order.
    pub(crate) fn all<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Row>> {
        self.query(sql, params, None)
    }

    /// Execute an insert/update/delete.
    pub(crate) fn run<P: Params>(&self, sql: &str, params: P) -> Result<RunResult> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        let changes = stmt.execute(params)?;
        let last_insert_id = conn.last_insert_rowid();
        debug!(changes, last_insert_id, "run");
        Ok(RunResult {
            changes,
            last_insert_id,
        })
    }

    fn query<P: Params>(&self, sql: &str, params: P, limit: Option<usize>) -> Result<Vec<Row>> {
        trace!(sql, "query");
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        let columns: Arc<[String]> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..columns.len())
                .map(|idx| row.get::<_, Value>(idx))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            out.push(Row::new(Arc::clone(&columns), values));

            if limit.is_some_and(|l| out.len() >= l) {
                break;
            }
        }

        Ok(out)
    }

    /// Serialize the whole engine into a SQLite database image.
    ///
    /// The image is copied out of the engine's own pages while the lock is
    /// held, so it is exactly the state at the moment of the call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the image cannot be produced.
    pub(crate) fn snapshot(&self) -> Result<Vec<u8>> {
        let conn = self.conn.lock();
        let image = conn
            .serialize(DatabaseName::Main)
            .map_err(|e| Error::Persistence(format!("cannot serialize engine: {e}")))?
            .to_vec();
        debug!(bytes = image.len(), "engine serialized");
        Ok(image)
    }
}

/// Load a snapshot image verbatim into `conn`.
///
/// The image is staged in a scratch file and restored from there, so this
/// blocks on disk I/O. Call it off the async runtime.
fn hydrate(conn: &mut Connection, bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(Error::Initialization("snapshot is empty".to_string()));
    }

    let mut scratch = tempfile::NamedTempFile::new()
        .map_err(|e| Error::Initialization(format!("cannot stage snapshot: {e}")))?;
    scratch
        .write_all(bytes)
        .and_then(|()| scratch.as_file().sync_all())
        .map_err(|e| Error::Initialization(format!("cannot stage snapshot: {e}")))?;

    conn.restore(DatabaseName::Main, scratch.path(), None::<fn(Progress)>)
        .map_err(|e| Error::Initialization(format!("corrupt snapshot: {e}")))?;

    let check: String = conn
        .query_row("PRAGMA quick_check", [], |row| row.get(0))
        .map_err(|e| Error::Initialization(format!("corrupt snapshot: {e}")))?;
    if check != "ok" {
        return Err(Error::Initialization(format!(
            "corrupt snapshot: integrity check reported '{check}'"
        )));
    }

    debug!(bytes = bytes.len(), "engine hydrated from snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    #[test]
    fn test_open_fresh_engine_has_schema() {
        let engine = Engine::open(None).unwrap();
        let rows = engine.all("SELECT * FROM projects", []).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_get_returns_first_row_only() {
        let engine = Engine::open(None).unwrap();
        engine.run("INSERT INTO projects (name) VALUES (?1)", ["a"]).unwrap();
        engine.run("INSERT INTO projects (name) VALUES (?1)", ["b"]).unwrap();

        let row = engine
            .get("SELECT name FROM projects ORDER BY id", [])
            .unwrap()
            .unwrap();
        assert_eq!(row.get::<String>("name").unwrap(), "a");
    }

    #[test]
    fn test_run_reports_changes_and_insert_id() {
        let engine = Engine::open(None).unwrap();
        let first = engine
            .run("INSERT INTO projects (name) VALUES (?1)", ["first"])
            .unwrap();
        assert_eq!(first.changes, 1);
        assert_eq!(first.last_insert_id, 1);

        engine.run("INSERT INTO projects (name) VALUES (?1)", ["second"]).unwrap();
        let updated = engine
            .run("UPDATE projects SET status = ?1", ["paused"])
            .unwrap();
        assert_eq!(updated.changes, 2);
    }

    #[test]
    fn test_snapshot_hydrate_round_trip() {
        let engine = Engine::open(None).unwrap();
        engine
            .run(
                "INSERT INTO projects (name, owner, budget) VALUES (?1, ?2, ?3)",
                params!["Canal", "Ines", 1250.5],
            )
            .unwrap();

        let image = engine.snapshot().unwrap();
        let restored = Engine::open(Some(image.as_slice())).unwrap();

        assert_eq!(
            engine.all("SELECT * FROM projects", []).unwrap(),
            restored.all("SELECT * FROM projects", []).unwrap()
        );
    }

    #[test]
    fn test_snapshot_is_a_sqlite_image_of_current_state() {
        let engine = Engine::open(None).unwrap();
        let empty = engine.snapshot().unwrap();
        assert!(empty.starts_with(b"SQLite format 3\0"));

        engine.run("INSERT INTO projects (name) VALUES (?1)", ["Weir"]).unwrap();
        let image = engine.snapshot().unwrap();
        assert!(image.starts_with(b"SQLite format 3\0"));

        let restored = Engine::open(Some(image.as_slice())).unwrap();
        let row = restored.get("SELECT name FROM projects", []).unwrap().unwrap();
        assert_eq!(row.get::<String>("name").unwrap(), "Weir");

        let before = Engine::open(Some(empty.as_slice())).unwrap();
        assert!(before.all("SELECT * FROM projects", []).unwrap().is_empty());
    }

    #[test]
    fn test_hydrate_rejects_garbage() {
        let err = Engine::open(Some(b"definitely not a sqlite image".as_slice())).unwrap_err();
        assert!(matches!(err, Error::Initialization(_)));
    }

    #[test]
    fn test_hydrate_rejects_empty_image() {
        let err = Engine::open(Some(&[][..])).unwrap_err();
        assert!(matches!(err, Error::Initialization(ref m) if m.contains("empty")));
    }
}
