//! Command implementations.

pub mod completions;
pub mod init;
pub mod project;
pub mod status;
pub mod version;

use crate::config::resolve_data_dir;
use crate::error::{Error, Result};
use crate::storage::{Database, SNAPSHOT_KEY, global_database};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

/// Resolve the data directory or fail with a config error.
pub(crate) fn data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_data_dir(explicit)
        .ok_or_else(|| Error::Config("Could not determine projdash data directory".to_string()))
}

/// Create the async runtime a command runs its database calls on.
pub(crate) fn runtime() -> Result<Runtime> {
    Runtime::new().map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))
}

/// Open the process-wide database for an initialized data directory and
/// wait for it to become ready.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] if the data directory has no snapshot,
/// or an initialization error if the snapshot cannot be loaded.
pub(crate) fn open_database(
    rt: &Runtime,
    explicit: Option<&Path>,
) -> Result<&'static Database> {
    let dir = data_dir(explicit)?;
    if !dir.join(SNAPSHOT_KEY).exists() {
        return Err(Error::NotInitialized);
    }

    let db = global_database(&dir);
    rt.block_on(db.ready())?;
    Ok(db)
}
