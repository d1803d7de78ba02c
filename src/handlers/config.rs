//! Configuration command handlers

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Write;
use std::path::Path;

use crate::config::TrackerConfig;

/// Handle `config --show`: print the effective configuration
pub fn handle_config_show(path: &Path, out: &mut impl Write) -> Result<TrackerConfig> {
    let config = TrackerConfig::load_from(path)?;

    writeln!(out, "{}", "Tracker Configuration".cyan().bold())?;
    writeln!(out, "{}", "=".repeat(60).cyan())?;
    if path.exists() {
        writeln!(out, "  Source:              {}", path.display())?;
    } else {
        writeln!(out, "  Source:              {}", "defaults (no config file)".yellow())?;
    }
    writeln!(out, "  Preference key:      {}", config.preference_key)?;
    writeln!(out, "  Url field:           {}", config.url_field)?;
    writeln!(out, "  Identifier field:    {}", config.identifier_field)?;
    writeln!(out, "  In-progress status:  {}", config.in_progress_status)?;
    writeln!(out, "  Completed status:    {}", config.completed_status)?;
    writeln!(out, "  Error status:        {}", config.error_status)?;
    writeln!(out, "  Payload error text:  {}", config.payload_error_message)?;
    writeln!(out, "  Raw in-progress:     {}", config.statuses.in_progress.join(", "))?;
    writeln!(out, "  Raw completed:       {}", config.statuses.completed.join(", "))?;
    writeln!(out, "  Raw failed:          {}", config.statuses.failed.join(", "))?;

    Ok(config)
}

/// Handle `config --init`: write the default configuration unless one exists
pub fn handle_config_init(path: &Path, out: &mut impl Write) -> Result<bool> {
    if path.exists() {
        writeln!(
            out,
            "{} Config already exists at {}",
            "!".yellow(),
            path.display()
        )?;
        return Ok(false);
    }

    TrackerConfig::default()
        .save_to(path)
        .context("Failed to write default tracker configuration")?;
    writeln!(out, "{} Wrote default config to {}", "✓".green(), path.display())?;
    Ok(true)
}
