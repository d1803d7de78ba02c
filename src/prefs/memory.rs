use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::Mutex;

use super::PreferenceStore;

/// In-process preferences, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing values
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: Mutex::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow!("memory preferences lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn put_string(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow!("memory preferences lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
