use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::TrackerConfig;

/// Incoming app operation request issued by the device agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub id: i64,

    /// Operation kind (install, update, uninstall), opaque to the tracker
    pub code: String,

    /// Either a JSON object or a string holding one
    pub payload: Value,
}

impl OperationRequest {
    pub fn new(id: i64, code: impl Into<String>, payload: Value) -> Self {
        Self {
            id,
            code: code.into(),
            payload,
        }
    }
}

/// The package an operation refers to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppTarget {
    pub url: Option<String>,
    pub identifier: Option<String>,
}

impl AppTarget {
    /// Extract the url and identifier fields from a request payload
    ///
    /// Both configured fields must be present and hold strings. A string payload
    /// is parsed as JSON first. The error is a human readable reason.
    pub fn from_payload(payload: &Value, config: &TrackerConfig) -> Result<Self, String> {
        let parsed;
        let object = match payload {
            Value::Object(map) => map,
            Value::String(text) => {
                parsed = serde_json::from_str::<Value>(text)
                    .map_err(|e| format!("payload is not valid JSON: {e}"))?;
                match &parsed {
                    Value::Object(map) => map,
                    _ => return Err("payload is not a JSON object".to_string()),
                }
            }
            _ => return Err("payload is not a JSON object".to_string()),
        };

        let field = |name: &str| -> Result<String, String> {
            match object.get(name) {
                Some(Value::String(value)) => Ok(value.clone()),
                Some(_) => Err(format!("field '{name}' is not a string")),
                None => Err(format!("missing field '{name}'")),
            }
        };

        Ok(Self {
            url: Some(field(&config.url_field)?),
            identifier: Some(field(&config.identifier_field)?),
        })
    }
}

/// Resolved status event to report upward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationNotification {
    pub id: i64,
    pub code: String,

    /// Normalized status, compared against the in-progress sentinel
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_response: Option<String>,
}
