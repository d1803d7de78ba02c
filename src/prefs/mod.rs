//! Key-value preference storage backing the pending operation list.
//!
//! The tracker keeps its whole state as one string value under one key, so a
//! backend only needs string get/put. Backends shared between processes also
//! hand out an exclusive lock that the store holds for each whole operation.

mod file;
mod memory;

use anyhow::Result;
use std::fs::File;
use std::path::{Path, PathBuf};

pub use file::FilePreferences;
pub use memory::MemoryPreferences;

/// Trait for persistent string preferences.
pub trait PreferenceStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn put_string(&self, key: &str, value: &str) -> Result<()>;

    /// Block until no other process can use these preferences.
    ///
    /// Backends private to one process return `None`.
    fn lock(&self) -> Result<Option<PreferenceLock>> {
        Ok(None)
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for std::sync::Arc<T> {
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        (**self).get_string(key)
    }

    fn put_string(&self, key: &str, value: &str) -> Result<()> {
        (**self).put_string(key, value)
    }

    fn lock(&self) -> Result<Option<PreferenceLock>> {
        (**self).lock()
    }
}

/// Advisory lock on a lock file, released on drop
#[derive(Debug)]
pub struct PreferenceLock {
    file: File,
    path: PathBuf,
}

impl PreferenceLock {
    pub(crate) fn new(file: File, path: PathBuf) -> Self {
        Self { file, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PreferenceLock {
    fn drop(&mut self) {
        if let Err(e) = fs2::FileExt::unlock(&self.file) {
            log::warn!("Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}
