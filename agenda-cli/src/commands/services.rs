//! Services command - schedule, browse and bill services

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use agenda_core::domain::{format_time, parse_date, parse_time, ClientInput};
use agenda_core::services::{LogEvent, LoggingService};
use agenda_core::{AgendaEntry, AgendaFilter, Locale, Service, ServiceStatus};

use super::{get_context, log_event, resolve_range};
use crate::output::{create_table, format_amount, or_dash, success};

#[derive(Subcommand)]
pub enum ServicesCommands {
    /// List services by date and time
    List {
        /// Year to show (whole year unless --month is given)
        #[arg(long)]
        year: Option<i32>,
        /// Month to show (1-12)
        #[arg(long)]
        month: Option<u32>,
        /// Only these statuses (pending, paid); repeatable
        #[arg(long, value_delimiter = ',')]
        status: Vec<ServiceStatus>,
        /// Only clients whose name contains this text
        #[arg(long)]
        client: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Schedule a service
    Add {
        /// Service date (YYYY-MM-DD or DD/MM/YYYY)
        date: String,
        /// Service time (HH:MM)
        time: String,
        /// Existing client ID
        #[arg(long, conflicts_with = "new_client")]
        client_id: Option<i64>,
        /// Create a client with this name for the service
        #[arg(long)]
        new_client: Option<String>,
        /// Phone of the new client
        #[arg(long, default_value = "")]
        phone: String,
        /// Address of the new client
        #[arg(long, default_value = "")]
        address: String,
        /// Kind of work
        #[arg(long = "type", default_value = "Fumigación general")]
        service_type: String,
        #[arg(long, default_value = "0")]
        amount: f64,
        #[arg(long, default_value = "pending")]
        status: ServiceStatus,
        #[arg(long, default_value = "")]
        notes: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one service
    Show {
        /// Service ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a service; omitted fields keep their current value
    Update {
        /// Service ID
        id: i64,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long, conflicts_with = "no_client")]
        client_id: Option<i64>,
        /// Unlink the service from its client
        #[arg(long)]
        no_client: bool,
        #[arg(long = "type")]
        service_type: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        status: Option<ServiceStatus>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a service
    Delete {
        /// Service ID
        id: i64,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

pub fn run(command: ServicesCommands, logger: &Option<LoggingService>) -> Result<()> {
    let ctx = get_context()?;
    let locale = ctx.config.locale;
    let backend = ctx.store.name().to_string();

    match command {
        ServicesCommands::List {
            year,
            month,
            status,
            client,
            json,
        } => {
            let range = resolve_range(year, month)?;
            let mut filter = AgendaFilter::new().with_statuses(status);
            if let Some(search) = client {
                filter = filter.with_client_search(search);
            }
            let entries = filter.apply(ctx.agenda_service.list_services(range)?);

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("{}", "No services found.".dimmed());
                return Ok(());
            }

            println!("{}", agenda_table(&entries, locale));
            let total: f64 = entries.iter().map(|e| e.service.amount).sum();
            println!(
                "{} services, {}",
                entries.len(),
                format_amount(total).bold()
            );
        }
        ServicesCommands::Add {
            date,
            time,
            client_id,
            new_client,
            phone,
            address,
            service_type,
            amount,
            status,
            notes,
            json,
        } => {
            let date = parse_date(&date)?;
            let time = parse_time(&time)?;

            let (client_id, id) = match new_client {
                Some(name) => {
                    let client = ClientInput::new(&name, &phone, &address, "")?;
                    let (client_id, id) = ctx.agenda_service.add_service_with_new_client(
                        &client,
                        date,
                        time,
                        &service_type,
                        amount,
                        status,
                        &notes,
                    )?;
                    log_event(
                        logger,
                        LogEvent::new("client_added")
                            .with_backend(&backend)
                            .with_entity("client", Some(client_id)),
                    );
                    (Some(client_id), id)
                }
                None => {
                    let id = ctx.agenda_service.add_service(
                        date,
                        time,
                        client_id,
                        &service_type,
                        amount,
                        status,
                        &notes,
                    )?;
                    (client_id, id)
                }
            };
            log_event(
                logger,
                LogEvent::new("service_added")
                    .with_backend(&backend)
                    .with_entity("service", Some(id)),
            );

            if json {
                println!("{}", serde_json::json!({ "id": id, "client_id": client_id }));
            } else {
                success(&format!(
                    "Scheduled service {} on {} at {}",
                    id,
                    date,
                    format_time(time)
                ));
            }
        }
        ServicesCommands::Show { id, json } => {
            let service = ctx.agenda_service.get_service(id)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&service)?);
                return Ok(());
            }

            let client = match service.client_id {
                Some(client_id) => match ctx.client_service.get_client(client_id) {
                    Ok(client) => client.name,
                    Err(_) => format!("#{} (deleted)", client_id),
                },
                None => "-".to_string(),
            };
            println!("{}", service_table(&service, &client, locale));
        }
        ServicesCommands::Update {
            id,
            date,
            time,
            client_id,
            no_client,
            service_type,
            amount,
            status,
            notes,
        } => {
            let current = ctx.agenda_service.get_service(id)?;
            let date = match date {
                Some(text) => parse_date(&text)?,
                None => current.date,
            };
            let time = match time {
                Some(text) => parse_time(&text)?,
                None => current.time,
            };
            let client_id = if no_client {
                None
            } else {
                client_id.or(current.client_id)
            };
            let notes = notes.or(current.notes).unwrap_or_default();

            ctx.agenda_service.update_service(
                id,
                date,
                time,
                client_id,
                service_type.as_deref().unwrap_or(&current.service_type),
                amount.unwrap_or(current.amount),
                status.unwrap_or(current.status),
                &notes,
            )?;
            log_event(
                logger,
                LogEvent::new("service_updated")
                    .with_backend(&backend)
                    .with_entity("service", Some(id)),
            );
            success(&format!("Updated service {}", id));
        }
        ServicesCommands::Delete { id, force } => {
            let service = ctx.agenda_service.get_service(id)?;

            if !force {
                println!(
                    "\n{}",
                    format!(
                        "This will delete the {} service on {}.",
                        format_amount(service.amount),
                        service.date
                    )
                    .yellow()
                );

                if !Confirm::new()
                    .with_prompt("Are you sure?")
                    .default(false)
                    .interact()?
                {
                    println!("{}\n", "Cancelled".dimmed());
                    return Ok(());
                }
            }

            ctx.agenda_service.delete_service(id)?;
            log_event(
                logger,
                LogEvent::new("service_deleted")
                    .with_backend(&backend)
                    .with_entity("service", Some(id)),
            );
            success(&format!("Deleted service {}", id));
        }
    }

    Ok(())
}

fn status_cell(status: ServiceStatus, locale: Locale) -> String {
    let label = locale.status_label(status);
    match status {
        ServiceStatus::Paid => label.green().to_string(),
        ServiceStatus::Pending => label.yellow().to_string(),
    }
}

fn agenda_table(entries: &[AgendaEntry], locale: Locale) -> comfy_table::Table {
    let mut table = create_table();
    let mut header = vec!["ID"];
    header.extend(locale.service_headers());
    table.set_header(header);

    for entry in entries {
        let service = &entry.service;
        table.add_row(vec![
            service.id.to_string(),
            service.date.to_string(),
            format_time(service.time),
            or_dash(entry.client_name.as_deref()),
            or_dash(entry.client_phone.as_deref()),
            or_dash(entry.client_address.as_deref()),
            service.service_type.clone(),
            format_amount(service.amount),
            status_cell(service.status, locale),
            or_dash(service.notes.as_deref()),
        ]);
    }
    table
}

fn service_table(service: &Service, client: &str, locale: Locale) -> comfy_table::Table {
    let [date, time, client_label, _, _, kind, amount, status, notes] = locale.service_headers();

    let mut table = create_table();
    table.add_row(vec!["ID".to_string(), service.id.to_string()]);
    table.add_row(vec![date.to_string(), service.date.to_string()]);
    table.add_row(vec![time.to_string(), format_time(service.time)]);
    table.add_row(vec![client_label.to_string(), client.to_string()]);
    table.add_row(vec![kind.to_string(), service.service_type.clone()]);
    table.add_row(vec![amount.to_string(), format_amount(service.amount)]);
    table.add_row(vec![status.to_string(), status_cell(service.status, locale)]);
    table.add_row(vec![notes.to_string(), or_dash(service.notes.as_deref())]);
    table
}
