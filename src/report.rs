use anyhow::{anyhow, Result};
use std::sync::Mutex;

/// Receives operation results that must reach the server without going
/// through the pending list, i.e. rejected payloads.
pub trait ResultReporter: Send + Sync {
    fn report_failure(
        &self,
        operation_id: i64,
        operation_code: &str,
        status: &str,
        message: &str,
    ) -> Result<()>;
}

/// Writes failures to the console log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ResultReporter for LogReporter {
    fn report_failure(
        &self,
        operation_id: i64,
        operation_code: &str,
        status: &str,
        message: &str,
    ) -> Result<()> {
        log::error!("Operation {operation_id} ({operation_code}) -> {status}: {message}");
        Ok(())
    }
}

/// A failure handed to a [`ResultReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub operation_id: i64,
    pub operation_code: String,
    pub status: String,
    pub message: String,
}

/// Keeps every reported failure in memory so a host can forward them later
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<FailureReport>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports received so far, oldest first
    pub fn reports(&self) -> Vec<FailureReport> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }

    /// Remove and return all reports received so far
    pub fn take(&self) -> Vec<FailureReport> {
        self.reports
            .lock()
            .map(|mut reports| std::mem::take(&mut *reports))
            .unwrap_or_default()
    }
}

impl ResultReporter for RecordingReporter {
    fn report_failure(
        &self,
        operation_id: i64,
        operation_code: &str,
        status: &str,
        message: &str,
    ) -> Result<()> {
        self.reports
            .lock()
            .map_err(|_| anyhow!("recording reporter lock poisoned"))?
            .push(FailureReport {
                operation_id,
                operation_code: operation_code.to_string(),
                status: status.to_string(),
                message: message.to_string(),
            });
        Ok(())
    }
}

impl<T: ResultReporter + ?Sized> ResultReporter for std::sync::Arc<T> {
    fn report_failure(
        &self,
        operation_id: i64,
        operation_code: &str,
        status: &str,
        message: &str,
    ) -> Result<()> {
        (**self).report_failure(operation_id, operation_code, status, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_reporter_keeps_order() {
        let reporter = RecordingReporter::new();
        reporter.report_failure(1, "INSTALL_APPLICATION", "ERROR", "bad").unwrap();
        reporter.report_failure(2, "UNINSTALL_APPLICATION", "ERROR", "worse").unwrap();

        let reports = reporter.reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].operation_id, 1);
        assert_eq!(reports[1].message, "worse");
    }

    #[test]
    fn test_take_drains() {
        let reporter = RecordingReporter::new();
        reporter.report_failure(1, "INSTALL_APPLICATION", "ERROR", "bad").unwrap();

        assert_eq!(reporter.take().len(), 1);
        assert!(reporter.reports().is_empty());
    }
}
