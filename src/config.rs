use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "pending-app-ops";

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the main configuration directory path following platform conventions:
    /// - Linux: $XDG_CONFIG_HOME/pending-app-ops or ~/.config/pending-app-ops
    /// - macOS: ~/Library/Application Support/pending-app-ops
    /// - Windows: %APPDATA%\pending-app-ops
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join(APP_DIR_NAME))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join(APP_DIR_NAME))
            }
        }

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join("Library").join("Application Support").join(APP_DIR_NAME))
        }

        #[cfg(target_os = "windows")]
        {
            Ok(dirs::config_dir()
                .context("Failed to get Windows config directory")?
                .join(APP_DIR_NAME))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join(format!(".{APP_DIR_NAME}")))
        }
    }

    /// Get the tracker config file path (tracker.toml)
    pub fn tracker_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("tracker.toml"))
    }

    /// Get the file-backed preference store path
    pub fn preferences_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("preferences.json"))
    }

    /// Get the log file path
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("pending-app-ops.log"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;
        Ok(config_dir)
    }
}

/// Raw platform statuses understood by the built-in status table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLists {
    /// Statuses meaning the app operation is still running
    #[serde(default = "default_in_progress_statuses")]
    pub in_progress: Vec<String>,

    /// Statuses meaning the app operation finished successfully
    #[serde(default = "default_completed_statuses")]
    pub completed: Vec<String>,

    /// Statuses meaning the app operation failed
    #[serde(default = "default_failed_statuses")]
    pub failed: Vec<String>,
}

fn default_in_progress_statuses() -> Vec<String> {
    ["DOWNLOAD_STARTED", "DOWNLOAD_COMPLETED", "INSTALLING", "UNINSTALLING", "IN_PROGRESS"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_completed_statuses() -> Vec<String> {
    ["INSTALLED", "UPDATED", "UNINSTALLED", "COMPLETED"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_failed_statuses() -> Vec<String> {
    ["DOWNLOAD_FAILED", "INSTALL_FAILED", "UNINSTALL_FAILED", "ERROR"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for StatusLists {
    fn default() -> Self {
        StatusLists {
            in_progress: default_in_progress_statuses(),
            completed: default_completed_statuses(),
            failed: default_failed_statuses(),
        }
    }
}

/// Externally configured constants consumed by the pending operation store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Preference key holding the serialized operation list
    #[serde(default = "default_preference_key")]
    pub preference_key: String,

    /// Payload field carrying the package download url
    #[serde(default = "default_url_field")]
    pub url_field: String,

    /// Payload field carrying the package identifier
    #[serde(default = "default_identifier_field")]
    pub identifier_field: String,

    /// Resolved status that keeps a record tracked for the next drain
    #[serde(default = "default_in_progress_status")]
    pub in_progress_status: String,

    /// Resolved status for failed operations, also used for payload rejections
    #[serde(default = "default_error_status")]
    pub error_status: String,

    /// Resolved status for successfully finished operations
    #[serde(default = "default_completed_status")]
    pub completed_status: String,

    /// Message reported upward when an operation payload cannot be parsed
    #[serde(default = "default_payload_error_message")]
    pub payload_error_message: String,

    #[serde(default)]
    pub statuses: StatusLists,
}

fn default_preference_key() -> String {
    "PENDING_APPLICATION_OPERATIONS".to_string()
}

fn default_url_field() -> String {
    "url".to_string()
}

fn default_identifier_field() -> String {
    "appIdentifier".to_string()
}

fn default_in_progress_status() -> String {
    "IN_PROGRESS".to_string()
}

fn default_error_status() -> String {
    "ERROR".to_string()
}

fn default_completed_status() -> String {
    "COMPLETED".to_string()
}

fn default_payload_error_message() -> String {
    "Error in parsing APPLICATION payload.".to_string()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            preference_key: default_preference_key(),
            url_field: default_url_field(),
            identifier_field: default_identifier_field(),
            in_progress_status: default_in_progress_status(),
            error_status: default_error_status(),
            completed_status: default_completed_status(),
            payload_error_message: default_payload_error_message(),
            statuses: StatusLists::default(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from the default location
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&ConfigManager::tracker_config_path()?)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: TrackerConfig =
            toml::from_str(&content).context("Failed to parse tracker config")?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&ConfigManager::tracker_config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize tracker config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Reject configurations the store cannot operate with
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("preference_key", &self.preference_key),
            ("url_field", &self.url_field),
            ("identifier_field", &self.identifier_field),
            ("in_progress_status", &self.in_progress_status),
            ("error_status", &self.error_status),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                bail!("Tracker config field '{name}' must not be empty");
            }
        }
        if self.url_field == self.identifier_field {
            bail!(
                "Tracker config url_field and identifier_field must differ (both '{}')",
                self.url_field
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_paths() {
        let config_dir = ConfigManager::config_dir().unwrap();
        assert!(config_dir.to_string_lossy().contains("pending-app-ops"));

        let tracker = ConfigManager::tracker_config_path().unwrap();
        assert!(tracker.ends_with("tracker.toml"));

        let prefs = ConfigManager::preferences_path().unwrap();
        assert!(prefs.ends_with("preferences.json"));

        let log = ConfigManager::log_file_path().unwrap();
        assert!(log.ends_with("pending-app-ops.log"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = TrackerConfig::load_from(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.identifier_field, "appIdentifier");
        assert_eq!(config.in_progress_status, "IN_PROGRESS");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tracker.toml");
        fs::write(
            &path,
            "url_field = \"appUrl\"\n\n[statuses]\ncompleted = [\"DONE\"]\n",
        )
        .unwrap();

        let config = TrackerConfig::load_from(&path).unwrap();
        assert_eq!(config.url_field, "appUrl");
        assert_eq!(config.identifier_field, "appIdentifier");
        assert_eq!(config.statuses.completed, vec!["DONE".to_string()]);
        assert_eq!(config.statuses.in_progress, default_in_progress_statuses());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("tracker.toml");

        let mut config = TrackerConfig::default();
        config.in_progress_status = "PENDING".to_string();
        config.save_to(&path).unwrap();

        let loaded = TrackerConfig::load_from(&path).unwrap();
        assert_eq!(loaded.in_progress_status, "PENDING");
    }

    #[test]
    fn test_validate_rejects_empty_sentinel() {
        let config = TrackerConfig {
            in_progress_status: "  ".to_string(),
            ..TrackerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("in_progress_status"));
    }

    #[test]
    fn test_validate_rejects_identical_fields() {
        let config = TrackerConfig {
            identifier_field: "url".to_string(),
            ..TrackerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
