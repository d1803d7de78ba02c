//! Command handler modules
//!
//! Each handler works against an already opened store so it can be driven by
//! the binary or by tests alike.

pub mod config;
pub mod queue;

use anyhow::{Context, Result};

use crate::config::TrackerConfig;
use crate::logger::OperationLog;
use crate::prefs::FilePreferences;
use crate::store::PendingOperationStore;

pub use config::{handle_config_init, handle_config_show};
pub use queue::{
    handle_drain, handle_enqueue, handle_find, handle_list, handle_update, DrainFormat,
};

/// Open the store backed by the default preferences file and `tracker.toml`
pub fn open_default_store() -> Result<PendingOperationStore> {
    let config = TrackerConfig::load().context("Failed to load tracker configuration")?;
    let prefs = FilePreferences::open_default()?;
    log::debug!("Using preferences file {}", prefs.path().display());
    let store = PendingOperationStore::new(prefs, config)?
        .with_operation_log(OperationLog::open_default()?);
    Ok(store)
}
