//! Queue command handlers
//!
//! Thin wrappers turning CLI arguments into store calls and printing results.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde_json::Value;
use std::io::Write;

use crate::operation::{AppOperation, OperationNotification, OperationRequest};
use crate::store::PendingOperationStore;

/// Output format of the drain command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainFormat {
    Text,
    Json,
}

/// Handle `enqueue`: start tracking the app named in the payload
pub fn handle_enqueue(
    store: &PendingOperationStore,
    id: i64,
    code: &str,
    payload: &str,
    out: &mut impl Write,
) -> Result<()> {
    let request = OperationRequest::new(id, code, Value::String(payload.to_string()));
    store
        .enqueue(&request)
        .with_context(|| format!("Failed to enqueue operation {id}"))?;

    writeln!(out, "{} Operation {} queued", "✓".green(), id)?;
    Ok(())
}

/// Handle `update`: record a platform status for an app
pub fn handle_update(
    store: &PendingOperationStore,
    url: Option<&str>,
    identifier: Option<&str>,
    status: &str,
    error: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    if url.is_none() && identifier.is_none() {
        bail!("Either --url or --identifier is required");
    }

    store.update_status(url, identifier, Some(status), error)?;

    writeln!(
        out,
        "{} Recorded status {} for {}",
        "✓".green(),
        status.bold(),
        identifier.or(url).unwrap_or_default()
    )?;
    Ok(())
}

/// Handle `drain`: print status changes and forget finished operations
pub fn handle_drain(
    store: &PendingOperationStore,
    format: DrainFormat,
    out: &mut impl Write,
) -> Result<Vec<OperationNotification>> {
    let notifications = store.drain_notifications()?;

    match format {
        DrainFormat::Json => {
            let text = serde_json::to_string_pretty(&notifications)
                .context("Failed to serialize notifications")?;
            writeln!(out, "{text}")?;
        }
        DrainFormat::Text => {
            if notifications.is_empty() {
                writeln!(out, "{}", "No status changes to report.".yellow())?;
            }
            for notification in &notifications {
                writeln!(
                    out,
                    "{} {} -> {}{}",
                    notification.id.to_string().cyan(),
                    notification.code,
                    colorize_status(&notification.status, store),
                    notification
                        .operation_response
                        .as_deref()
                        .map(|r| format!(" ({r})"))
                        .unwrap_or_default()
                )?;
            }
        }
    }

    Ok(notifications)
}

/// Handle `find`: show the first record matching the url or identifier
pub fn handle_find(
    store: &PendingOperationStore,
    url: Option<&str>,
    identifier: Option<&str>,
    out: &mut impl Write,
) -> Result<Option<AppOperation>> {
    let found = store.find(url, identifier)?;
    match &found {
        Some(operation) => print_operation(operation, out)?,
        None => writeln!(out, "{}", "No pending operation found.".yellow())?,
    }
    Ok(found)
}

/// Handle `list`: show every pending record
pub fn handle_list(store: &PendingOperationStore, out: &mut impl Write) -> Result<usize> {
    let pending = store.pending()?;
    if pending.is_empty() {
        writeln!(out, "{}", "No pending app operations.".yellow())?;
    } else {
        writeln!(out, "{}", format!("{} pending app operation(s)", pending.len()).bold())?;
        for operation in &pending {
            print_operation(operation, out)?;
        }
    }
    Ok(pending.len())
}

fn print_operation(operation: &AppOperation, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "  {} {} {}",
        operation.operation_id.to_string().cyan(),
        operation.operation_code,
        operation.app_identifier.as_deref().unwrap_or("-")
    )?;
    writeln!(out, "      url:    {}", operation.url.as_deref().unwrap_or("-"))?;
    writeln!(
        out,
        "      status: {} (last reported: {})",
        operation.operation_status.as_deref().unwrap_or("-"),
        operation.last_status.as_deref().unwrap_or("-")
    )?;
    if let Some(error) = &operation.operation_error_message {
        writeln!(out, "      error:  {}", error.red())?;
    }
    Ok(())
}

fn colorize_status(status: &str, store: &PendingOperationStore) -> colored::ColoredString {
    let config = store.config();
    if status == config.in_progress_status {
        status.yellow()
    } else if status == config.error_status {
        status.red()
    } else {
        status.green()
    }
}
