//! Summary command - paid and pending totals for a month

use anyhow::Result;
use chrono::Datelike;
use colored::Colorize;

use super::{get_context, resolve_month};
use crate::output::{create_table, format_amount};

pub fn run(year: Option<i32>, month: Option<u32>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let locale = ctx.config.locale;
    let range = resolve_month(year, month)?;
    let summary = ctx.agenda_service.summarize(Some(range))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "start": range.start,
                "end": range.end,
                "summary": summary,
            }))?
        );
        return Ok(());
    }

    println!(
        "{}",
        format!("{} {}", locale.month_name(range.start.month()), range.start.year()).bold()
    );
    println!();

    let mut table = create_table();
    table.add_row(vec![
        locale.status_label(agenda_core::ServiceStatus::Paid).to_string(),
        format_amount(summary.paid_total).green().to_string(),
    ]);
    table.add_row(vec![
        locale.status_label(agenda_core::ServiceStatus::Pending).to_string(),
        format_amount(summary.pending_total).yellow().to_string(),
    ]);
    table.add_row(vec!["Services".to_string(), summary.service_count.to_string()]);
    println!("{}", table);

    if !summary.per_day.is_empty() {
        println!();
        let mut days = create_table();
        days.set_header(vec![locale.service_headers()[0], "Services"]);
        for day in &summary.per_day {
            days.add_row(vec![day.date.to_string(), day.services.to_string()]);
        }
        println!("{}", days);
    }

    Ok(())
}
