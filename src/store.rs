//! The pending app operation list and its four lock-guarded operations.
//!
//! Every operation loads the whole list from the preference store, works on
//! it in memory and writes the whole list back before the lock is released.
//! The lock is the store's own mutex plus whatever exclusive lock the
//! preference backend hands out, so separate processes sharing one
//! preferences file are serialized too.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::codec::{JsonCodec, OperationCodec};
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::logger::OperationLog;
use crate::operation::{AppOperation, AppTarget, OperationNotification, OperationRequest};
use crate::prefs::{PreferenceLock, PreferenceStore};
use crate::report::{LogReporter, ResultReporter};
use crate::resolver::{StatusResolver, StatusTable};

const EMPTY_LIST: &str = "[]";

/// Tracks app install, update and removal requests until they finish
pub struct PendingOperationStore {
    prefs: Box<dyn PreferenceStore>,
    codec: Box<dyn OperationCodec>,
    reporter: Box<dyn ResultReporter>,
    resolver: Box<dyn StatusResolver>,
    config: TrackerConfig,
    operation_log: Option<OperationLog>,
    lock: Mutex<()>,
}

impl PendingOperationStore {
    /// Create a store over `prefs` with the JSON codec, the log reporter and
    /// a status table built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidConfig`] when `config` fails
    /// [`TrackerConfig::validate`].
    pub fn new(prefs: impl PreferenceStore + 'static, config: TrackerConfig) -> Result<Self> {
        config.validate().map_err(TrackerError::InvalidConfig)?;

        Ok(Self {
            prefs: Box::new(prefs),
            codec: Box::new(JsonCodec),
            reporter: Box::new(LogReporter),
            resolver: Box::new(StatusTable::from_config(&config)),
            config,
            operation_log: None,
            lock: Mutex::new(()),
        })
    }

    pub fn with_codec(mut self, codec: impl OperationCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    pub fn with_reporter(mut self, reporter: impl ResultReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn with_resolver(mut self, resolver: impl StatusResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Also append lifecycle events of each operation to `operation_log`
    pub fn with_operation_log(mut self, operation_log: OperationLog) -> Self {
        self.operation_log = Some(operation_log);
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// First stored record whose identifier or url matches
    pub fn find(&self, url: Option<&str>, identifier: Option<&str>) -> Result<Option<AppOperation>> {
        let _guard = self.acquire()?;
        let operations = self.load()?;
        Ok(find_match(&operations, url, identifier).cloned())
    }

    /// Start tracking the app named in `request`'s payload
    ///
    /// An unknown app is appended as a fresh record. Every record already
    /// matching the payload's url or identifier is handed over to the new
    /// request with its reported state cleared.
    ///
    /// # Errors
    ///
    /// A payload that is not a JSON object with both configured string fields
    /// is reported as failed through the result reporter and then rejected
    /// with [`TrackerError::InvalidPayload`]; nothing is persisted.
    pub fn enqueue(&self, request: &OperationRequest) -> Result<()> {
        let _guard = self.acquire()?;

        let target = match AppTarget::from_payload(&request.payload, &self.config) {
            Ok(target) => target,
            Err(reason) => return Err(self.reject(request, reason)),
        };

        let mut operations = self.load()?;
        let url = target.url.as_deref();
        let identifier = target.identifier.as_deref();

        if find_match(&operations, url, identifier).is_none() {
            let operation = AppOperation::new(request, target.clone());
            log::info!("Tracking new app operation {}", operation.label());
            self.note(request.id, "queued");
            operations.push(operation);
        } else {
            for operation in operations
                .iter_mut()
                .filter(|op| op.matches(url, identifier))
            {
                operation.restart(request);
                log::info!("Restarted app operation {}", operation.label());
            }
            self.note(request.id, "restarted");
        }

        self.persist(&operations)
    }

    /// Record a platform status on every record matching the url or identifier
    ///
    /// Nothing matching is not an error; the list is still rewritten.
    pub fn update_status(
        &self,
        url: Option<&str>,
        identifier: Option<&str>,
        status: Option<&str>,
        error: Option<&str>,
    ) -> Result<()> {
        let _guard = self.acquire()?;

        let mut operations = self.load()?;
        let mut matched = 0usize;
        for operation in operations
            .iter_mut()
            .filter(|op| op.matches(url, identifier))
        {
            operation.set_status(status.map(str::to_string), error.map(str::to_string));
            matched += 1;
        }

        if matched == 0 {
            log::debug!(
                "No pending app operation for url={:?} identifier={:?}",
                url,
                identifier
            );
        } else {
            log::debug!("Status {:?} recorded on {} app operation(s)", status, matched);
        }

        self.persist(&operations)
    }

    /// Collect status changes to report and forget finished operations
    ///
    /// Each record with a reported status is resolved. The notification is
    /// returned only when its resolved status differs from the one reported
    /// last time. Only records resolving to the in-progress sentinel stay in
    /// the list; everything else, including records that never got a status,
    /// is dropped.
    pub fn drain_notifications(&self) -> Result<Vec<OperationNotification>> {
        let _guard = self.acquire()?;

        let operations = self.load()?;
        let mut in_progress = Vec::new();
        let mut notifications = Vec::new();

        for mut operation in operations {
            let Some(status) = operation.reported_status() else {
                log::debug!("Dropping unreported app operation {}", operation.label());
                self.note(operation.operation_id, "dropped without a status");
                continue;
            };

            let notification = self.resolver.resolve(
                operation.operation_id,
                &operation.operation_code,
                status,
                operation.operation_error_message.as_deref(),
            );

            if operation.last_status.as_deref() != Some(notification.status.as_str()) {
                operation.last_status = Some(notification.status.clone());
                log::info!(
                    "App operation {} is now {}",
                    operation.label(),
                    notification.status
                );
                notifications.push(notification.clone());
            }

            if notification.status == self.config.in_progress_status {
                in_progress.push(operation);
            } else {
                log::debug!("App operation {} finished", operation.label());
                self.note(
                    operation.operation_id,
                    &format!("finished as {}", notification.status),
                );
            }
        }

        self.persist(&in_progress)?;
        Ok(notifications)
    }

    /// Snapshot of every stored record, in stored order
    pub fn pending(&self) -> Result<Vec<AppOperation>> {
        let _guard = self.acquire()?;
        self.load()
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.pending()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.pending()?.is_empty())
    }

    fn acquire(&self) -> Result<OperationGuard<'_>> {
        // The mutex guards no data; the stored list is always a complete write.
        let local = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let shared = self.prefs.lock()?;
        Ok(OperationGuard {
            _shared: shared,
            _local: local,
        })
    }

    fn reject(&self, request: &OperationRequest, reason: String) -> TrackerError {
        log::warn!("Rejecting operation {} ({}): {}", request.id, request.code, reason);
        self.note(request.id, &format!("rejected: {reason}"));

        if let Err(e) = self.reporter.report_failure(
            request.id,
            &request.code,
            &self.config.error_status,
            &self.config.payload_error_message,
        ) {
            log::warn!("Failed to report rejected operation {}: {:#}", request.id, e);
        }

        TrackerError::InvalidPayload {
            operation_id: request.id,
            reason,
        }
    }

    fn note(&self, operation_id: i64, event: &str) {
        let Some(operation_log) = &self.operation_log else {
            return;
        };
        if let Err(e) = operation_log.record(&self.config.preference_key, operation_id, event) {
            log::warn!("Failed to write {}: {:#}", operation_log.path().display(), e);
        }
    }

    fn load(&self) -> Result<Vec<AppOperation>> {
        let key = &self.config.preference_key;
        let text = self.prefs.get_string(key)?;
        let operations = self
            .codec
            .decode(key, text.as_deref().unwrap_or(EMPTY_LIST))?;
        log::debug!("Loaded {} pending app operation(s)", operations.len());
        Ok(operations)
    }

    fn persist(&self, operations: &[AppOperation]) -> Result<()> {
        let text = self.codec.encode(operations)?;
        self.prefs.put_string(&self.config.preference_key, &text)?;
        log::debug!("Persisted {} pending app operation(s)", operations.len());
        Ok(())
    }
}

/// Held for the duration of one store operation. The backend lock is
/// released before the mutex.
struct OperationGuard<'a> {
    _shared: Option<PreferenceLock>,
    _local: MutexGuard<'a, ()>,
}

fn find_match<'a>(
    operations: &'a [AppOperation],
    url: Option<&str>,
    identifier: Option<&str>,
) -> Option<&'a AppOperation> {
    operations.iter().find(|op| op.matches(url, identifier))
}
