use anyhow::{Context, Result};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

use super::{PreferenceLock, PreferenceStore};

/// Preferences kept as a JSON object of string values in a single file
///
/// Every put rewrites the whole file through a uniquely named temporary
/// sibling and a rename, so readers never observe a half-written map.
/// Exclusion across processes comes from [`PreferenceStore::lock`], which
/// holds an advisory lock on a `<file>.lock` sibling.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Preferences at the default location in the config directory
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(crate::config::ConfigManager::preferences_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the advisory lock file next to the preferences file
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("preferences"));
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path).with_context(|| {
            format!("Failed to read preferences from: {}", self.path.display())
        })?;

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).with_context(|| {
            format!("Failed to parse preferences JSON from: {}", self.path.display())
        })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir).with_context(|| {
            format!("Failed to create preferences directory: {}", dir.display())
        })?;

        let content =
            serde_json::to_string_pretty(map).context("Failed to serialize preferences")?;

        let mut staged = NamedTempFile::new_in(dir).with_context(|| {
            format!("Failed to create staging file in: {}", dir.display())
        })?;
        staged
            .write_all(content.as_bytes())
            .context("Failed to write staged preferences")?;
        staged.persist(&self.path).with_context(|| {
            format!("Failed to replace preferences file: {}", self.path.display())
        })?;

        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn put_string(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)?;

        log::debug!("Wrote preference '{}' to {}", key, self.path.display());
        Ok(())
    }

    fn lock(&self) -> Result<Option<PreferenceLock>> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir).with_context(|| {
            format!("Failed to create preferences directory: {}", dir.display())
        })?;

        let lock_path = self.lock_path();
        let file: File = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

        file.lock_exclusive()
            .with_context(|| format!("Failed to lock preferences: {}", lock_path.display()))?;

        Ok(Some(PreferenceLock::new(file, lock_path)))
    }
}
