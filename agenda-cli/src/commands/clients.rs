//! Clients command - list, add, edit and remove clients

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use agenda_core::services::{LogEvent, LoggingService};

use super::{get_context, log_event};
use crate::output::{create_table, or_dash, success};

#[derive(Subcommand)]
pub enum ClientsCommands {
    /// List all clients
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a client
    Add {
        /// Client name
        name: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a client; omitted fields keep their current value
    Update {
        /// Client ID
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a client; their services stay, unlinked
    Delete {
        /// Client ID
        id: i64,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

pub fn run(command: ClientsCommands, logger: &Option<LoggingService>) -> Result<()> {
    let ctx = get_context()?;
    let locale = ctx.config.locale;
    let backend = ctx.store.name().to_string();

    match command {
        ClientsCommands::List { json } => {
            let clients = ctx.client_service.list_clients()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&clients)?);
                return Ok(());
            }

            if clients.is_empty() {
                println!("{}", "No clients yet.".dimmed());
                return Ok(());
            }

            let mut table = create_table();
            let mut header = vec!["ID"];
            header.extend(locale.client_headers());
            table.set_header(header);
            for client in &clients {
                table.add_row(vec![
                    client.id.to_string(),
                    client.name.clone(),
                    or_dash(client.phone.as_deref()),
                    or_dash(client.address.as_deref()),
                    or_dash(client.notes.as_deref()),
                ]);
            }
            println!("{}", table);
        }
        ClientsCommands::Add {
            name,
            phone,
            address,
            notes,
            json,
        } => {
            let id = ctx.client_service.add_client(&name, &phone, &address, &notes)?;
            log_event(
                logger,
                LogEvent::new("client_added")
                    .with_backend(&backend)
                    .with_entity("client", Some(id)),
            );

            if json {
                println!("{}", serde_json::json!({ "id": id }));
            } else {
                success(&format!("Added client '{}' (id {})", name.trim(), id));
            }
        }
        ClientsCommands::Update {
            id,
            name,
            phone,
            address,
            notes,
        } => {
            let current = ctx.client_service.get_client(id)?;
            let name = name.unwrap_or(current.name);
            let phone = phone.or(current.phone).unwrap_or_default();
            let address = address.or(current.address).unwrap_or_default();
            let notes = notes.or(current.notes).unwrap_or_default();

            ctx.client_service
                .update_client(id, &name, &phone, &address, &notes)?;
            log_event(
                logger,
                LogEvent::new("client_updated")
                    .with_backend(&backend)
                    .with_entity("client", Some(id)),
            );
            success(&format!("Updated client {}", id));
        }
        ClientsCommands::Delete { id, force } => {
            let client = ctx.client_service.get_client(id)?;

            if !force {
                println!(
                    "\n{}",
                    format!("This will delete client '{}'.", client.name).yellow()
                );
                println!("{}\n", "Their services are kept without a client.".dimmed());

                if !Confirm::new()
                    .with_prompt("Are you sure?")
                    .default(false)
                    .interact()?
                {
                    println!("{}\n", "Cancelled".dimmed());
                    return Ok(());
                }
            }

            let unlinked = ctx.client_service.delete_client(id)?;
            log_event(
                logger,
                LogEvent::new("client_deleted")
                    .with_backend(&backend)
                    .with_entity("client", Some(id)),
            );
            success(&format!(
                "Deleted client '{}' ({} services unlinked)",
                client.name, unlinked
            ));
        }
    }

    Ok(())
}
