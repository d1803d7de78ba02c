use crate::error::{Result, TrackerError};
use crate::operation::AppOperation;

/// Converts the pending operation list to and from its persisted text form.
pub trait OperationCodec: Send + Sync {
    fn encode(&self, operations: &[AppOperation]) -> Result<String>;

    /// `key` names the preference the text came from, for error reporting.
    fn decode(&self, key: &str, text: &str) -> Result<Vec<AppOperation>>;
}

/// Compact JSON array of camelCase objects
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl OperationCodec for JsonCodec {
    fn encode(&self, operations: &[AppOperation]) -> Result<String> {
        serde_json::to_string(operations).map_err(TrackerError::Encode)
    }

    fn decode(&self, key: &str, text: &str) -> Result<Vec<AppOperation>> {
        serde_json::from_str(text).map_err(|source| TrackerError::CorruptStore {
            key: key.to_string(),
            source,
        })
    }
}
