//! Persisted key-value flags.
//!
//! Small pieces of state that must survive restarts (such as whether the user
//! asked for location recording) go through a [`KeyValueStore`]. Writes are
//! synchronous and visible to the next read in the same process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use ini::Ini;
use thiserror::Error;

/// INI section holding persisted flags.
const STATE_SECTION: &str = "state";

/// Errors from a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read.
    #[error("Failed to read state file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// The backing file could not be written.
    #[error("Failed to write state file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persistent boolean flags addressed by key.
pub trait KeyValueStore: Send + Sync {
    /// Read a flag. Missing or unreadable keys read as `None`.
    fn get_bool(&self, key: &str) -> Option<bool>;

    /// Write a flag durably before returning.
    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError>;
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, bool>>,
}

impl MemoryKeyValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// File-backed store using an INI `[state]` section.
///
/// Every write rewrites the file before returning, and every read goes to
/// the file, so separate instances over the same path agree.
#[derive(Debug)]
pub struct IniKeyValueStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl IniKeyValueStore {
    /// Create a store over `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at the default location (~/.trailnav/state.ini).
    pub fn open_default() -> Self {
        Self::new(super::file::state_file_path())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Ini, StoreError> {
        if !self.path.exists() {
            return Ok(Ini::new());
        }
        Ini::load_from_file(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for IniKeyValueStore {
    fn get_bool(&self, key: &str) -> Option<bool> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let ini = match self.load() {
            Ok(ini) => ini,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable state file");
                return None;
            }
        };
        ini.get_from(Some(STATE_SECTION), key)
            .and_then(|v| v.trim().parse().ok())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        // An unreadable file is replaced rather than blocking the write.
        let mut ini = self.load().unwrap_or_default();
        ini.with_section(Some(STATE_SECTION))
            .set(key, value.to_string());

        let write_error = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_error)?;
            }
        }
        ini.write_to_file(&self.path).map_err(write_error)
    }
}
