//! File-backed key/value store
//!
//! Provides a `FileStore` that stores serializable values as JSON files,
//! one per key, and reads them back leniently.

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

use super::{StoreError, StoreResult};

/// Reads and writes JSON values on disk
///
/// Values live in an XDG-compliant data directory (`~/.local/share/infobus/`
/// on Linux). Writes go to a temporary file that is renamed over the target,
/// so a concurrent reader sees either the old or the new value.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory where value files are stored
    dir: PathBuf,
}

impl FileStore {
    /// Creates a new FileStore using the platform data directory
    ///
    /// Returns `None` if the directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("kz", "infobus", "infobus")?;
        Some(Self {
            dir: project_dirs.data_dir().to_path_buf(),
        })
    }

    /// Creates a new FileStore with a custom directory
    ///
    /// Useful for testing or when a specific location is configured.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory holding the value files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path to the file for the given key
    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Writes a value under `key`, replacing any previous value
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;

        fs::create_dir_all(&self.dir)?;

        // Each write gets its own temp file so concurrent writers of a key never share one
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&json)?;
        tmp.persist(self.path(key)).map_err(|e| e.error)?;
        Ok(())
    }

    /// Reads the value stored under `key`
    ///
    /// Returns `None` if the key is missing or the file cannot be parsed as `T`.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let content = fs::read(self.path(key)).ok()?;
        match serde_json::from_slice(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "ignoring unreadable stored value");
                None
            }
        }
    }

    /// Removes the value stored under `key`; removing a missing key is not an error
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a value file exists for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.path(key).exists()
    }
}
