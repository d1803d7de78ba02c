//! # pending-app-ops
//!
//! Tracks application install, update and removal requests on a managed device
//! until the platform reports that they finished.
//!
//! ## Overview
//!
//! A device agent hands every app operation request to a
//! [`PendingOperationStore`](store::PendingOperationStore). The store keeps one
//! record per app, persisted as a JSON array under a single preference key.
//! The platform reports raw statuses as installs progress, and the agent
//! periodically drains the store for notifications to send upstream. Records
//! leave the store as soon as their status resolves to anything other than
//! the configured in-progress value.
//!
//! ## Architecture
//!
//! - Record and request types ([`operation`])
//! - The lock-guarded store itself ([`store`])
//! - Collaborators behind traits: preference storage ([`prefs`]), list
//!   encoding ([`codec`]), failure reporting ([`report`]) and status
//!   resolution ([`resolver`])
//! - Configuration, errors and logging ([`config`], [`error`], [`logger`])
//! - Command handlers for the host binary ([`handlers`])

/// Platform configuration directory and the tracker's configured constants.
///
/// Field names in operation payloads, the preference key, the in-progress
/// sentinel and the raw status lists are all read from `tracker.toml`.
pub mod config;

/// Encoding of the pending operation list to its persisted text form.
pub mod codec;

/// Error taxonomy of the store.
pub mod error;

/// Command handlers behind the `pending-app-ops` binary.
pub mod handlers;

/// Logging configuration and utilities.
///
/// Sets up console logging (configurable via `RUST_LOG`) and a persistent log
/// file in the config directory with size-based rotation.
pub mod logger;

/// App operation records, incoming requests and outgoing notifications.
pub mod operation;

/// String key-value storage the pending list is persisted in.
pub mod prefs;

/// Out-of-band reporting of rejected operations.
pub mod report;

/// Mapping of raw platform statuses to reported statuses.
pub mod resolver;

/// The pending operation store.
pub mod store;

pub use error::TrackerError;
pub use operation::{AppOperation, OperationNotification, OperationRequest};
pub use store::PendingOperationStore;
