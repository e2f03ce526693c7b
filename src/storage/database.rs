//! The database handle: readiness gate, query primitives, persistence.
//!
//! Access is split into two phases:
//!
//! 1. **Acquire** - [`Database::ready`] loads the engine once (hydrating it
//!    from the stored snapshot if there is one) and resolves readiness.
//! 2. **Use** - [`Database::get`], [`Database::all`] and [`Database::run`]
//!    are synchronous and fail with [`Error::NotReady`] until phase 1 has
//!    completed.
//!
//! Mutations are never written to durable storage implicitly. Call
//! [`Database::persist`] once after a batch of `run` calls that must survive
//! a restart.

use crate::error::{Error, Result};
use crate::storage::engine::Engine;
use crate::storage::row::{Row, RunResult};
use crate::storage::snapshot::{FileSnapshotStore, SnapshotStore};
use rusqlite::Params;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Fixed key the snapshot is stored under.
pub const SNAPSHOT_KEY: &str = "projdash.sqlite";

/// Handle owning the engine instance.
///
/// The engine is created lazily by the first [`ready`](Self::ready) call and
/// reused for the lifetime of the handle. It is never handed out; every
/// statement goes through the handle.
#[derive(Debug)]
pub struct Database<S: SnapshotStore = FileSnapshotStore> {
    store: S,
    key: String,
    engine: OnceLock<Engine>,
    /// Held for the whole of one load attempt.
    gate: Mutex<LastFailure>,
    /// Number of load attempts that have failed.
    failures: AtomicU64,
    loads: AtomicUsize,
}

/// Message of the most recent failed load, shared with every caller that
/// was waiting on that attempt.
#[derive(Debug, Default)]
struct LastFailure {
    message: Option<String>,
}

impl<S: SnapshotStore> Database<S> {
    /// Create a handle over `store` using the default snapshot key.
    ///
    /// Nothing is loaded until [`ready`](Self::ready) is awaited.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_key(store, SNAPSHOT_KEY)
    }

    /// Create a handle over `store` using a custom snapshot key.
    #[must_use]
    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            engine: OnceLock::new(),
            gate: Mutex::new(LastFailure::default()),
            failures: AtomicU64::new(0),
            loads: AtomicUsize::new(0),
        }
    }

    /// The snapshot store backing this handle.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The key the snapshot is stored under.
    #[must_use]
    pub fn snapshot_key(&self) -> &str {
        &self.key
    }

    /// Initialize the engine and resolve readiness.
    ///
    /// Idempotent: once ready, returns immediately. Concurrent callers while
    /// a load is in flight wait for that load instead of starting another,
    /// and all of them see its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Initialization`] if the snapshot cannot be read or
    /// loaded, or schema setup fails. Callers that were waiting on the failed
    /// attempt receive the same error; none of them retries. Readiness stays
    /// unresolved and the next call made after the failure starts over.
    pub async fn ready(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }

        let seen_failures = self.failures.load(Ordering::SeqCst);
        let mut last = self.gate.lock().await;

        if self.is_ready() {
            return Ok(());
        }
        if self.failures.load(Ordering::SeqCst) != seen_failures {
            // The attempt this call waited on failed
            let message = last.message.clone().unwrap_or_default();
            return Err(Error::Initialization(message));
        }

        match self.load().await {
            Ok(engine) => {
                // Only the gate holder sets the cell
                let _ = self.engine.set(engine);
                last.message = None;
                Ok(())
            }
            Err(e) => {
                last.message = Some(match &e {
                    Error::Initialization(message) => message.clone(),
                    other => other.to_string(),
                });
                self.failures.fetch_add(1, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Whether readiness has resolved.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.engine.get().is_some()
    }

    async fn load(&self) -> Result<Engine> {
        let attempt = self.loads.fetch_add(1, Ordering::SeqCst) + 1;

        let snapshot = self.store.read(&self.key).await.map_err(|e| {
            Error::Initialization(format!("cannot read snapshot '{}': {e}", self.key))
        })?;
        let hydrated = snapshot.is_some();

        // Hydration stages the image on disk
        let engine = tokio::task::spawn_blocking(move || Engine::open(snapshot.as_deref()))
            .await
            .map_err(|e| Error::Initialization(format!("engine loader task failed: {e}")))?
            .inspect_err(|e| {
                warn!(key = %self.key, attempt, error = %e, "Engine initialization failed");
            })?;

        info!(key = %self.key, attempt, hydrated, "Engine ready");
        Ok(engine)
    }

    /// Number of engine loads attempted so far.
    #[cfg(test)]
    pub(crate) fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn engine(&self) -> Result<&Engine> {
        self.engine.get().ok_or(Error::NotReady)
    }

    /// Run a query and return its first row, or `None` if it matched nothing.
    ///
    /// Rows past the first are ignored; write the query to return at most
    /// one row.
    ///
    /// # Errors
    ///
    /// [`Error::NotReady`] before readiness, [`Error::Engine`] if the
    /// statement is rejected.
    pub fn get<P: Params>(&self, sql: &str, params: P) -> Result<Option<Row>> {
        self.engine()?.get(sql, params)
    }

    /// Run a query and return every row in engine order.
    ///
    /// # Errors
    ///
    /// [`Error::NotReady`] before readiness, [`Error::Engine`] if the
    /// statement is rejected.
    pub fn all<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Row>> {
        self.engine()?.all(sql, params)
    }

    /// Execute an insert, update or delete. Does not persist.
    ///
    /// # Errors
    ///
    /// [`Error::NotReady`] before readiness, [`Error::Engine`] if the
    /// statement is rejected. A rejected statement leaves the engine usable.
    pub fn run<P: Params>(&self, sql: &str, params: P) -> Result<RunResult> {
        self.engine()?.run(sql, params)
    }

    /// [`get`](Self::get), decoding the row into `T` by column name.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get), plus [`Error::Decode`] if the row does not fit `T`.
    pub fn get_as<T: DeserializeOwned, P: Params>(&self, sql: &str, params: P) -> Result<Option<T>> {
        self.get(sql, params)?.map(|row| row.decode()).transpose()
    }

    /// [`all`](Self::all), decoding every row into `T` by column name.
    ///
    /// # Errors
    ///
    /// As [`all`](Self::all), plus [`Error::Decode`] if a row does not fit `T`.
    pub fn all_as<T: DeserializeOwned, P: Params>(&self, sql: &str, params: P) -> Result<Vec<T>> {
        self.all(sql, params)?.iter().map(Row::decode).collect()
    }

    /// Write the current engine state to the snapshot store.
    ///
    /// The image is taken under the engine lock before the first suspension
    /// point, so it reflects exactly the state at the time of the call.
    ///
    /// # Errors
    ///
    /// [`Error::NotReady`] before readiness, [`Error::Persistence`] if the
    /// image cannot be produced or the store rejects the write. Live data is
    /// untouched and the call can be retried.
    pub async fn persist(&self) -> Result<()> {
        let image = self.engine()?.snapshot()?;
        let bytes = image.len();

        self.store
            .write(&self.key, &image)
            .await
            .map_err(|e| Error::Persistence(format!("cannot write snapshot '{}': {e}", self.key)))
            .inspect_err(|e| warn!(key = %self.key, error = %e, "Persist failed"))?;

        info!(key = %self.key, bytes, "Snapshot persisted");
        Ok(())
    }
}

// ── Process-wide handle ───────────────────────────────────────

static DATABASE: OnceLock<Database<FileSnapshotStore>> = OnceLock::new();

/// The process-wide database handle.
///
/// Created on first call with a file store rooted at `data_dir` and reused
/// for the rest of the process. Later calls return the same handle; a
/// different `data_dir` on a later call is ignored with a warning.
pub fn global_database(data_dir: &Path) -> &'static Database<FileSnapshotStore> {
    let db = DATABASE.get_or_init(|| Database::new(FileSnapshotStore::new(data_dir)));
    if db.store().dir() != data_dir {
        warn!(
            requested = %data_dir.display(),
            active = %db.store().dir().display(),
            "Global database already bound to another data directory"
        );
    }
    db
}
