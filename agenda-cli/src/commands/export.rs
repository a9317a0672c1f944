//! Export command - write the spreadsheet report

use std::path::PathBuf;

use anyhow::Result;

use agenda_core::services::{LogEvent, LoggingService};

use super::{get_context, log_event, resolve_range};
use crate::output::success;

pub fn run(
    year: Option<i32>,
    month: Option<u32>,
    output: Option<PathBuf>,
    json: bool,
    logger: &Option<LoggingService>,
) -> Result<()> {
    let ctx = get_context()?;
    let range = resolve_range(year, month)?;

    let result = match output {
        Some(path) => ctx.report_service.export_spreadsheet_to(range, &path)?,
        None => ctx.report_service.export_spreadsheet(range)?,
    };
    log_event(
        logger,
        LogEvent::new("report_exported")
            .with_backend(ctx.store.name())
            .with_entity("report", None),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        success(&format!(
            "Exported {} services and {} clients to {}",
            result.services,
            result.clients,
            result.path.display()
        ));
    }

    Ok(())
}
