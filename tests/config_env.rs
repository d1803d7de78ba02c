//! Configuration directory resolution driven by XDG_CONFIG_HOME.
//!
//! These tests mutate the process environment and therefore run serially.

#![cfg(target_os = "linux")]

use anyhow::Result;
use pending_app_ops::config::{ConfigManager, TrackerConfig};
use pending_app_ops::handlers;
use pending_app_ops::OperationRequest;
use serde_json::json;
use serial_test::serial;
use tempfile::TempDir;

struct XdgGuard {
    previous: Option<String>,
    _dir: TempDir,
}

impl XdgGuard {
    fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        let previous = std::env::var("XDG_CONFIG_HOME").ok();
        std::env::set_var("XDG_CONFIG_HOME", dir.path());
        Ok(Self {
            previous,
            _dir: dir,
        })
    }
}

impl Drop for XdgGuard {
    fn drop(&mut self) {
        match &self.previous {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }
}

#[test]
#[serial]
fn test_xdg_config_home_respected() -> Result<()> {
    let _guard = XdgGuard::new()?;
    let xdg = std::env::var("XDG_CONFIG_HOME")?;

    let config_dir = ConfigManager::config_dir()?;
    assert_eq!(config_dir, std::path::Path::new(&xdg).join("pending-app-ops"));

    let created = ConfigManager::ensure_config_dir()?;
    assert!(created.is_dir());
    Ok(())
}

#[test]
#[serial]
fn test_default_store_uses_config_dir() -> Result<()> {
    let _guard = XdgGuard::new()?;

    let store = handlers::open_default_store()?;
    store.enqueue(&OperationRequest::new(
        1,
        "INSTALL_APPLICATION",
        json!({"url": "http://x/app.apk", "appIdentifier": "com.app"}),
    ))?;

    assert!(ConfigManager::preferences_path()?.exists());
    assert_eq!(handlers::open_default_store()?.len()?, 1);
    Ok(())
}

#[test]
#[serial]
fn test_default_store_reads_tracker_toml() -> Result<()> {
    let _guard = XdgGuard::new()?;

    let config = TrackerConfig {
        identifier_field: "packageName".into(),
        ..TrackerConfig::default()
    };
    config.save()?;

    let store = handlers::open_default_store()?;
    assert_eq!(store.config().identifier_field, "packageName");

    store.enqueue(&OperationRequest::new(
        1,
        "INSTALL_APPLICATION",
        json!({"url": "http://x/app.apk", "packageName": "com.app"}),
    ))?;
    assert!(store.find(None, Some("com.app"))?.is_some());
    Ok(())
}

#[test]
#[serial]
fn test_invalid_tracker_toml_is_rejected() -> Result<()> {
    let _guard = XdgGuard::new()?;

    let path = ConfigManager::tracker_config_path()?;
    std::fs::create_dir_all(path.parent().unwrap())?;
    std::fs::write(&path, "url_field = \"\"\n")?;

    assert!(handlers::open_default_store().is_err());
    Ok(())
}
