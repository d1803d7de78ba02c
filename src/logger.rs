use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::ConfigManager;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Initialize console logging and open the operation log
///
/// **Console logging** can be controlled via the `RUST_LOG` environment variable:
/// - `RUST_LOG=error` - Only errors
/// - `RUST_LOG=warn` - Warnings and errors
/// - `RUST_LOG=info` - Info, warnings, and errors (default)
/// - `RUST_LOG=debug` - Store loads and persists as well
/// - `RUST_LOG=trace` - Everything
///
/// The returned [`OperationLog`] lives next to the tracker configuration, e.g.
/// `~/.config/pending-app-ops/pending-app-ops.log` on Linux, and is rotated
/// before use.
///
/// ## Examples
///
/// ```bash
/// # Watch every load/persist round trip of the store
/// RUST_LOG=debug pending-app-ops drain
///
/// # No console output (the operation log is still written)
/// RUST_LOG=off pending-app-ops list
/// ```
pub fn init_logger() -> Result<OperationLog> {
    ConfigManager::ensure_config_dir()?;

    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:5}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .try_init()
        .ok(); // already initialized

    let operation_log = OperationLog::open_default()?;
    if operation_log.rotate_if_needed()? {
        log::info!("Operation log rotated");
    }
    Ok(operation_log)
}

/// Append-only record of what happened to each pending operation
///
/// Lines look like
/// `[2026-01-05 10:31:07] PENDING_APPLICATION_OPERATIONS #42 restarted`,
/// so one operation can be followed with a plain `grep '#42 '`.
#[derive(Debug, Clone)]
pub struct OperationLog {
    path: PathBuf,
}

impl OperationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log file in the platform config directory
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(ConfigManager::log_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event for `operation_id` stored under `preference_key`
    pub fn record(&self, preference_key: &str, operation_id: i64, event: &str) -> Result<()> {
        self.append(&format!("{preference_key} #{operation_id} {event}"))
    }

    fn append(&self, line: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open log file: {}", self.path.display()))?;

        writeln!(
            file,
            "[{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            line
        )?;
        Ok(())
    }

    /// Move the log aside to `.log.old` once it exceeds 10MB
    ///
    /// Returns whether a rotation happened.
    pub fn rotate_if_needed(&self) -> Result<bool> {
        let size = match std::fs::metadata(&self.path) {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        if size <= MAX_LOG_SIZE {
            return Ok(false);
        }

        let old = self.path.with_extension("log.old");
        if old.exists() {
            std::fs::remove_file(&old)?;
        }
        std::fs::rename(&self.path, &old)
            .with_context(|| format!("Failed to rotate {}", self.path.display()))?;
        Ok(true)
    }
}
