//! Durable snapshot stores.
//!
//! A snapshot store is a key/value byte store. The database writes its full
//! image under one fixed key and reads it back on the next start.
//!
//! - [`FileSnapshotStore`] - one file per key in a directory, atomic replace
//! - [`MemorySnapshotStore`] - process-local map, shareable between handles

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, File};
use std::future::Future;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Key/value byte store holding durable snapshots.
///
/// `write` must be all-or-nothing: either the stored bytes are fully
/// replaced or the call fails and the previous bytes remain.
pub trait SnapshotStore: Send + Sync {
    /// Read the bytes stored under `key`, or `None` if nothing is stored.
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Replace the bytes stored under `key`.
    fn write(&self, key: &str, bytes: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Remove whatever is stored under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

// ── File store ────────────────────────────────────────────────

/// Directory-backed store: the snapshot for `key` lives at `<dir>/<key>`.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the snapshot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the key is empty or would
    /// escape the store directory.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\'])
            || key.ends_with(".tmp")
        {
            return Err(Error::InvalidArgument(format!("invalid snapshot key: '{key}'")));
        }
        Ok(self.dir.join(key))
    }
}

impl SnapshotStore for FileSnapshotStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "snapshot read");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || atomic_write(&path, &bytes))
            .await
            .map_err(|e| Error::Other(format!("snapshot writer task failed: {e}")))?
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to a temporary file (same path with `.tmp` appended)
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let written = (|| -> std::io::Result<()> {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content)?;
        writer.flush()?;
        // Sync to disk before rename
        writer.get_ref().sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

// ── Memory store ──────────────────────────────────────────────

/// In-memory store. Clones share the same contents, so a second
/// `Database` built on a clone sees what the first one persisted.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    #[cfg(test)]
    reject_writes: Arc<AtomicBool>,
}

impl MemorySnapshotStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `write` fail as if the medium were full.
    #[cfg(test)]
    pub(crate) fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Bytes currently stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(key).cloned()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        // Let concurrent initializers interleave
        #[cfg(test)]
        tokio::task::yield_now().await;
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        #[cfg(test)]
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::StorageFull,
                "snapshot store rejected the write",
            )));
        }
        self.entries.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("snap.sqlite");

        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!temp_dir.path().join("nested").join("snap.sqlite.tmp").exists());
    }

    #[test]
    fn test_path_for_rejects_escaping_keys() {
        let store = FileSnapshotStore::new("/data");
        assert!(store.path_for("projdash.sqlite").is_ok());
        assert!(store.path_for("").is_err());
        assert!(store.path_for("..").is_err());
        assert!(store.path_for("../etc/passwd").is_err());
        assert!(store.path_for("a\\b").is_err());
        assert!(store.path_for("x.tmp").is_err());
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(temp_dir.path());

        assert_eq!(store.read("k").await.unwrap(), None);

        store.write("k", b"bytes").await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), Some(b"bytes".to_vec()));

        store.remove("k").await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), None);

        // Removing twice is fine
        store.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_contents() {
        let store = MemorySnapshotStore::new();
        let other = store.clone();

        store.write("k", b"v").await.unwrap();
        assert_eq!(other.read("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_memory_store_rejected_write_keeps_old_bytes() {
        let store = MemorySnapshotStore::new();
        store.write("k", b"old").await.unwrap();

        store.set_reject_writes(true);
        assert!(store.write("k", b"new").await.is_err());
        assert_eq!(store.get("k"), Some(b"old".to_vec()));
    }
}
