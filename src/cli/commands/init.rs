//! Initialize a projdash data directory.
//!
//! Creates the data directory (default `~/.projdash/data/`, or
//! `~/.projdash/test/` when `PD_TEST_DATA=1`) and writes an empty snapshot
//! holding just the schema. Every other command requires that snapshot.

use crate::cli::commands::{data_dir, runtime};
use crate::error::{Error, Result};
use crate::storage::{Database, FileSnapshotStore, SNAPSHOT_KEY, SnapshotStore};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
struct InitOutput {
    path: PathBuf,
    snapshot: PathBuf,
    reset: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] if a snapshot exists and `force`
/// is not set, or an error if the directory or snapshot cannot be written.
pub fn execute(explicit_dir: Option<&Path>, force: bool, json: bool) -> Result<()> {
    let dir = data_dir(explicit_dir)?;
    let snapshot_path = dir.join(SNAPSHOT_KEY);
    let existed = snapshot_path.exists();

    if existed && !force {
        return Err(Error::AlreadyInitialized {
            path: snapshot_path,
        });
    }

    fs::create_dir_all(&dir)?;

    // Write global .gitignore (for safety if someone puts this in git)
    let gitignore_path = dir.join(".gitignore");
    if !gitignore_path.exists() || force {
        fs::write(&gitignore_path, "# projdash snapshots are local-only\n*\n")?;
    }

    let rt = runtime()?;
    let store = FileSnapshotStore::new(&dir);
    rt.block_on(async {
        if existed {
            store.remove(SNAPSHOT_KEY).await?;
        }
        let db = Database::new(store);
        db.ready().await?;
        db.persist().await
    })?;
    info!(dir = %dir.display(), reset = existed, "Initialized data directory");

    if json {
        let output = InitOutput {
            path: dir,
            snapshot: snapshot_path,
            reset: existed,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
    } else if !crate::is_silent() {
        if existed {
            println!("Reset projdash data directory");
        } else {
            println!("Initialized projdash data directory");
        }
        println!("  Snapshot: {}", snapshot_path.display());
        println!();
        println!("Next: pd project create \"My Project\"");
    }

    Ok(())
}
