//! CLI command implementations

pub mod clients;
pub mod config;
pub mod export;
pub mod logs;
pub mod services;
pub mod summary;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use agenda_core::services::{LogEvent, LoggingService};
use agenda_core::{AgendaContext, DateRange};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the agenda directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("AGENDA_DIR") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".agenda"))
        .context("Could not find home directory; set AGENDA_DIR")
}

/// Build the context for the configured backend
pub fn get_context() -> Result<AgendaContext> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create agenda directory: {:?}", data_dir))?;

    AgendaContext::new(&data_dir).context("Failed to initialize agenda context")
}

/// Turn `--year`/`--month` into a date range
///
/// A month without a year uses the current year; a year alone covers the
/// whole year. Neither means no range.
pub fn resolve_range(year: Option<i32>, month: Option<u32>) -> Result<Option<DateRange>> {
    match (year, month) {
        (None, None) => Ok(None),
        (year, Some(month)) => {
            let year = year.unwrap_or_else(|| Local::now().year());
            Ok(Some(DateRange::month(year, month)?))
        }
        (Some(year), None) => {
            let start = NaiveDate::from_ymd_opt(year, 1, 1);
            let end = year
                .checked_add(1)
                .and_then(|next| NaiveDate::from_ymd_opt(next, 1, 1));
            match (start, end) {
                (Some(start), Some(end)) => Ok(Some(DateRange::new(start, end)?)),
                _ => bail!("year {} is out of range", year),
            }
        }
    }
}

/// Like `resolve_range`, defaulting to the current month
pub fn resolve_month(year: Option<i32>, month: Option<u32>) -> Result<DateRange> {
    match resolve_range(year, month)? {
        Some(range) => Ok(range),
        None => Ok(DateRange::month_of(Local::now().date_naive())),
    }
}
