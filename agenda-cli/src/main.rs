//! Agenda CLI - service scheduling and billing in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use agenda_core::services::LoggingService;

mod commands;
mod output;

use commands::{clients, config, export, logs, services, summary};

/// Agenda - clients, services and billing for a service business
#[derive(Parser)]
#[command(name = "agenda", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage clients
    Clients {
        #[command(subcommand)]
        command: clients::ClientsCommands,
    },

    /// Schedule and manage services
    Services {
        #[command(subcommand)]
        command: services::ServicesCommands,
    },

    /// Show paid and pending totals for a month
    Summary {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export services and clients to a spreadsheet
    Export {
        /// Only services in this year
        #[arg(long)]
        year: Option<i32>,
        /// Only services in this month
        #[arg(long)]
        month: Option<u32>,
        /// Write here instead of the configured export path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

impl Commands {
    /// Name recorded in the event log
    fn name(&self) -> &'static str {
        match self {
            Commands::Clients { command } => match command {
                clients::ClientsCommands::List { .. } => "clients list",
                clients::ClientsCommands::Add { .. } => "clients add",
                clients::ClientsCommands::Update { .. } => "clients update",
                clients::ClientsCommands::Delete { .. } => "clients delete",
            },
            Commands::Services { command } => match command {
                services::ServicesCommands::List { .. } => "services list",
                services::ServicesCommands::Add { .. } => "services add",
                services::ServicesCommands::Show { .. } => "services show",
                services::ServicesCommands::Update { .. } => "services update",
                services::ServicesCommands::Delete { .. } => "services delete",
            },
            Commands::Summary { .. } => "summary",
            Commands::Export { .. } => "export",
            Commands::Logs { .. } => "logs",
            Commands::Config { .. } => "config",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logger = commands::get_logger();
    let command_name = cli.command.name();

    // logging should never break the app
    if let Some(l) = &logger {
        let _ = l.log_command(command_name);
    }

    match run(cli, &logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(l) = &logger {
                let _ = l.log_command_failed(
                    command_name,
                    &e.to_string(),
                    Some(format!("{:?}", e).as_str()),
                );
            }
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, logger: &Option<LoggingService>) -> Result<()> {
    match cli.command {
        Commands::Clients { command } => clients::run(command, logger),
        Commands::Services { command } => services::run(command, logger),
        Commands::Summary { year, month, json } => summary::run(year, month, json),
        Commands::Export { year, month, output, json } => {
            export::run(year, month, output, json, logger)
        }
        Commands::Logs { command } => logs::run(command, logger.as_ref()),
        Commands::Config { command } => config::run(command),
    }
}
