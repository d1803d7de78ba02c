//! App operation records and the request/notification types around them.

mod record;
mod types;

pub use record::AppOperation;
pub use types::{AppTarget, OperationNotification, OperationRequest};
