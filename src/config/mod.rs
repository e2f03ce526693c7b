//! Configuration management.
//!
//! This module resolves where projdash keeps its durable snapshot.
//!
//! # Layout
//!
//! - **Data directory**: `~/.projdash/data/` by default
//! - **Snapshot**: one file per snapshot key inside the data directory
//!   (see [`crate::storage::SNAPSHOT_KEY`])
//!
//! The database itself only ever lives in memory; the data directory holds
//! the serialized image written by `persist`.

use std::path::{Path, PathBuf};

/// Get the global projdash directory location (`~/.projdash/`).
#[must_use]
pub fn global_projdash_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".projdash"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `PD_TEST_DATA=1` (or any non-empty value).
/// This redirects all snapshot I/O to an isolated test directory.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("PD_TEST_DATA").is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Get the test data directory (`~/.projdash/test/`).
#[must_use]
pub fn test_data_dir() -> Option<PathBuf> {
    global_projdash_dir().map(|dir| dir.join("test"))
}

/// Resolve the data directory.
///
/// Priority:
/// 1. If `explicit_path` is provided (`--data-dir` / `PD_DATA_DIR`), use it directly
/// 2. `PD_TEST_DATA` environment variable → uses the test directory
/// 3. `PROJDASH_DATA` environment variable
/// 4. Global location: `~/.projdash/data/`
///
/// # Returns
///
/// Returns the data directory, or `None` if no home directory can be found.
#[must_use]
pub fn resolve_data_dir(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_data_dir();
    }

    if let Ok(dir) = std::env::var("PROJDASH_DATA") {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir));
        }
    }

    global_projdash_dir().map(|dir| dir.join("data"))
}
