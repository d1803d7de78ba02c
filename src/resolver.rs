use crate::config::TrackerConfig;
use crate::operation::OperationNotification;

/// Maps a raw platform status onto the notification reported upward.
pub trait StatusResolver: Send + Sync {
    fn resolve(
        &self,
        operation_id: i64,
        operation_code: &str,
        status: &str,
        error_message: Option<&str>,
    ) -> OperationNotification;
}

/// Table-driven resolver built from the configured status lists
///
/// Raw statuses listed as in-progress resolve to the in-progress sentinel even
/// when an error message accompanies them. Otherwise any error message, any
/// status listed as failed and any unknown status resolve to the error status.
#[derive(Debug, Clone)]
pub struct StatusTable {
    in_progress: Vec<String>,
    completed: Vec<String>,
    failed: Vec<String>,
    in_progress_status: String,
    completed_status: String,
    error_status: String,
}

impl StatusTable {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            in_progress: config.statuses.in_progress.clone(),
            completed: config.statuses.completed.clone(),
            failed: config.statuses.failed.clone(),
            in_progress_status: config.in_progress_status.clone(),
            completed_status: config.completed_status.clone(),
            error_status: config.error_status.clone(),
        }
    }

    fn classify(&self, status: &str, has_error: bool) -> &str {
        let listed = |list: &[String]| list.iter().any(|s| s == status);

        if listed(&self.in_progress) {
            self.in_progress_status.as_str()
        } else if has_error || listed(&self.failed) {
            self.error_status.as_str()
        } else if listed(&self.completed) {
            self.completed_status.as_str()
        } else {
            log::warn!("Unknown application status '{status}', treating as failed");
            self.error_status.as_str()
        }
    }
}

impl Default for StatusTable {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}

impl StatusResolver for StatusTable {
    fn resolve(
        &self,
        operation_id: i64,
        operation_code: &str,
        status: &str,
        error_message: Option<&str>,
    ) -> OperationNotification {
        let error_message = error_message.filter(|m| !m.is_empty());
        let resolved = self.classify(status, error_message.is_some());

        OperationNotification {
            id: operation_id,
            code: operation_code.to_string(),
            status: resolved.to_string(),
            operation_response: Some(error_message.unwrap_or(status).to_string()),
        }
    }
}

impl<T: StatusResolver + ?Sized> StatusResolver for std::sync::Arc<T> {
    fn resolve(
        &self,
        operation_id: i64,
        operation_code: &str,
        status: &str,
        error_message: Option<&str>,
    ) -> OperationNotification {
        (**self).resolve(operation_id, operation_code, status, error_message)
    }
}
