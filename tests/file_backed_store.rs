use anyhow::Result;
use pending_app_ops::config::TrackerConfig;
use pending_app_ops::prefs::{FilePreferences, PreferenceStore};
use pending_app_ops::report::RecordingReporter;
use pending_app_ops::{OperationRequest, PendingOperationStore, TrackerError};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

/// Test helper to open a store over a preferences file in a temp dir
fn open_store(dir: &TempDir) -> PendingOperationStore {
    let prefs = FilePreferences::new(dir.path().join("preferences.json"));
    PendingOperationStore::new(prefs, TrackerConfig::default())
        .unwrap()
        .with_reporter(RecordingReporter::new())
}

fn install(id: i64, identifier: &str) -> OperationRequest {
    OperationRequest::new(
        id,
        "INSTALL_APPLICATION",
        json!({"url": format!("http://repo/{identifier}.apk"), "appIdentifier": identifier}),
    )
}

#[test]
fn test_state_survives_reopen() -> Result<()> {
    let dir = TempDir::new()?;

    {
        let store = open_store(&dir);
        store.enqueue(&install(1, "com.a"))?;
        store.update_status(None, Some("com.a"), Some("INSTALLING"), None)?;
        assert_eq!(store.drain_notifications()?.len(), 1);
    }

    let reopened = open_store(&dir);
    let pending = reopened.pending()?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].last_status.as_deref(), Some("IN_PROGRESS"));

    // already reported, so nothing new after a restart
    assert!(reopened.drain_notifications()?.is_empty());
    Ok(())
}

#[test]
fn test_preferences_file_layout() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(&dir);
    store.enqueue(&install(1, "com.a"))?;

    let content = fs::read_to_string(dir.path().join("preferences.json"))?;
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)?;
    let blob = map["PENDING_APPLICATION_OPERATIONS"].as_str().unwrap();
    assert!(blob.starts_with('['));
    assert!(blob.contains("\"appIdentifier\":\"com.a\""));
    Ok(())
}

#[test]
fn test_other_preference_keys_are_preserved() -> Result<()> {
    let dir = TempDir::new()?;
    let prefs = FilePreferences::new(dir.path().join("preferences.json"));
    prefs.put_string("enrollment_token", "abc")?;

    let store = open_store(&dir);
    store.enqueue(&install(1, "com.a"))?;
    store.drain_notifications()?;

    assert_eq!(prefs.get_string("enrollment_token")?.as_deref(), Some("abc"));
    Ok(())
}

#[test]
fn test_corrupt_stored_list_surfaces_error() -> Result<()> {
    let dir = TempDir::new()?;
    let prefs = FilePreferences::new(dir.path().join("preferences.json"));
    prefs.put_string("PENDING_APPLICATION_OPERATIONS", "[{\"operationId\":")?;

    let store = open_store(&dir);
    let err = store.enqueue(&install(1, "com.a")).unwrap_err();
    assert!(matches!(err, TrackerError::CorruptStore { .. }));

    // the corrupt value is left for inspection
    assert_eq!(
        prefs.get_string("PENDING_APPLICATION_OPERATIONS")?.as_deref(),
        Some("[{\"operationId\":")
    );
    Ok(())
}

#[test]
fn test_concurrent_enqueues_are_not_lost() -> Result<()> {
    let dir = TempDir::new()?;
    let store = Arc::new(open_store(&dir));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 0..5 {
                    let id = worker * 100 + n;
                    store
                        .enqueue(&install(id, &format!("com.app{worker}.n{n}")))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len()?, 40);
    Ok(())
}

#[test]
fn test_separate_stores_on_one_file_do_not_lose_records() -> Result<()> {
    let dir = TempDir::new()?;
    // independent instances, as two CLI processes would have
    let stores = [Arc::new(open_store(&dir)), Arc::new(open_store(&dir))];

    let handles: Vec<_> = stores
        .iter()
        .enumerate()
        .map(|(slot, store)| {
            let store = Arc::clone(store);
            thread::spawn(move || -> Vec<String> {
                let mut errors = Vec::new();
                for n in 0..25 {
                    let id = (slot as i64) * 1000 + n;
                    if let Err(e) = store.enqueue(&install(id, &format!("com.s{slot}.app{n}"))) {
                        errors.push(format!("{e:#}"));
                    }
                }
                errors
            })
        })
        .collect();

    for handle in handles {
        let errors = handle.join().unwrap();
        assert!(errors.is_empty(), "enqueue failed: {errors:?}");
    }

    assert_eq!(open_store(&dir).len()?, 50);

    let leftovers: Vec<_> = fs::read_dir(dir.path())?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    let mut leftovers = leftovers;
    leftovers.sort();
    assert_eq!(leftovers, vec!["preferences.json", "preferences.json.lock"]);
    Ok(())
}

#[test]
fn test_concurrent_status_updates_and_drains() -> Result<()> {
    let dir = TempDir::new()?;
    let store = Arc::new(open_store(&dir));
    for n in 0..10 {
        store.enqueue(&install(n, &format!("com.app{n}")))?;
        store.update_status(None, Some(&format!("com.app{n}")), Some("DOWNLOAD_STARTED"), None)?;
    }

    let updater = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for n in 0..10 {
                store
                    .update_status(None, Some(&format!("com.app{n}")), Some("INSTALLING"), None)
                    .unwrap();
            }
        })
    };
    let drainer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            let mut seen = Vec::new();
            for _ in 0..20 {
                seen.extend(store.drain_notifications().unwrap());
            }
            seen
        })
    };

    updater.join().unwrap();
    let mut notified = drainer.join().unwrap();
    notified.extend(store.drain_notifications()?);

    let mut ids: Vec<i64> = notified.iter().map(|n| n.id).collect();
    ids.sort();
    assert_eq!(ids, (0..10).collect::<Vec<_>>());
    assert!(notified.iter().all(|n| n.status == "IN_PROGRESS"));

    let pending = store.pending()?;
    assert_eq!(pending.len(), 10);
    for operation in &pending {
        assert_eq!(operation.operation_status.as_deref(), Some("INSTALLING"));
        assert_eq!(operation.last_status.as_deref(), Some("IN_PROGRESS"));
    }
    Ok(())
}
