//! Durable storage backends for the cache and usage snapshots.
//!
//! Stores serialize their whole state to bytes and hand it to a
//! [`SnapshotBackend`]. The file backend writes to a sibling temp file and
//! renames it over the target so a crash mid-write leaves the previous
//! snapshot intact.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Where a store keeps its serialized snapshot.
pub trait SnapshotBackend: Send + Sync {
    /// Read the last stored snapshot, `None` if nothing was stored yet.
    fn load(&self) -> io::Result<Option<Vec<u8>>>;

    /// Replace the stored snapshot.
    fn store(&self, bytes: &[u8]) -> io::Result<()>;

    /// Human-readable location for log lines.
    fn describe(&self) -> String;
}

/// Snapshot kept in a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotBackend for JsonFileBackend {
    fn load(&self) -> io::Result<Option<Vec<u8>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read(&self.path)?;
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(raw))
    }

    fn store(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        fs::write(&temp, bytes)?;
        fs::rename(&temp, &self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Snapshot kept in memory, for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    contents: Mutex<Option<Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with pre-existing bytes, e.g. to simulate a damaged file.
    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: Mutex::new(Some(bytes.into())),
        }
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SnapshotBackend for MemoryBackend {
    fn load(&self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.contents())
    }

    fn store(&self, bytes: &[u8]) -> io::Result<()> {
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(bytes.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
