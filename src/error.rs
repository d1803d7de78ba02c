use thiserror::Error;

/// Errors surfaced by [`PendingOperationStore`](crate::store::PendingOperationStore)
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The operation payload was not a JSON object carrying both required fields.
    /// The failure has already been handed to the result reporter.
    #[error("Invalid payload for operation {operation_id}: {reason}")]
    InvalidPayload { operation_id: i64, reason: String },

    /// The persisted operation list could not be decoded
    #[error("Corrupt pending operation list under preference key '{key}'")]
    CorruptStore {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The operation list could not be encoded for persistence
    #[error("Failed to encode pending operation list")]
    Encode(#[source] serde_json::Error),

    /// The tracker configuration cannot be used
    #[error("Invalid tracker configuration: {0}")]
    InvalidConfig(#[source] anyhow::Error),

    /// The backing preference store failed
    #[error("Preference store failure")]
    Storage(#[from] anyhow::Error),
}

impl TrackerError {
    /// True for payload rejections, the only error a caller can fix by resending
    pub fn is_validation(&self) -> bool {
        matches!(self, TrackerError::InvalidPayload { .. })
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
