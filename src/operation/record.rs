use serde::{Deserialize, Serialize};

use super::types::{AppTarget, OperationRequest};

/// Persisted state of one pending app install, update or removal
///
/// Field names on the wire are camelCase (`operationId`, `appIdentifier`, ...)
/// and unset optional fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppOperation {
    /// Id of the operation request that last touched this app
    pub operation_id: i64,

    /// Operation kind, passed through untouched
    pub operation_code: String,

    /// Download location of the package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Package identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_identifier: Option<String>,

    /// Latest raw status reported by the platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_status: Option<String>,

    /// Resolved status that was last reported upward
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status: Option<String>,

    /// Latest error text reported by the platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_error_message: Option<String>,
}

impl AppOperation {
    /// Create a fresh, unreported record for a request
    pub fn new(request: &OperationRequest, target: AppTarget) -> Self {
        Self {
            operation_id: request.id,
            operation_code: request.code.clone(),
            url: target.url,
            app_identifier: target.identifier,
            operation_status: None,
            last_status: None,
            operation_error_message: None,
        }
    }

    /// True when the identifier or the url equals this record's
    ///
    /// Absent inputs never match, so a record matches on either key alone.
    pub fn matches(&self, url: Option<&str>, identifier: Option<&str>) -> bool {
        let identifier_match =
            identifier.is_some() && identifier == self.app_identifier.as_deref();
        let url_match = url.is_some() && url == self.url.as_deref();
        identifier_match || url_match
    }

    /// Hand the record over to a new request and forget all reported state
    pub fn restart(&mut self, request: &OperationRequest) {
        self.operation_id = request.id;
        self.operation_code = request.code.clone();
        self.operation_status = None;
        self.last_status = None;
        self.operation_error_message = None;
    }

    /// Record the latest platform status
    pub fn set_status(&mut self, status: Option<String>, error: Option<String>) {
        self.operation_status = status;
        self.operation_error_message = error;
    }

    /// Raw status, if one has been reported and it is not blank
    pub fn reported_status(&self) -> Option<&str> {
        self.operation_status
            .as_deref()
            .filter(|status| !status.is_empty())
    }

    /// Short label for log lines
    pub fn label(&self) -> String {
        format!(
            "{} (operation {})",
            self.app_identifier
                .as_deref()
                .or(self.url.as_deref())
                .unwrap_or("<unknown app>"),
            self.operation_id
        )
    }
}
