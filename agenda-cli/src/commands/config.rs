//! Config command - show and change settings

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use agenda_core::config::{Backend, Config, ENV_STORE_KEY, ENV_STORE_URL};

use super::get_data_dir;
use crate::output::{create_table, success, warning};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a setting (backend, locale, exportPath)
    Set {
        key: String,
        value: String,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let data_dir = get_data_dir()?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&data_dir)?;
            let key_state = if config.store_key.is_some() { "set" } else { "not set" };

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "dataDir": data_dir,
                        "backend": config.backend.to_string(),
                        "locale": config.locale.code(),
                        "exportPath": config.export_path,
                        "storeUrl": config.store_url,
                        "storeKey": key_state,
                    }))?
                );
                return Ok(());
            }

            let mut table = create_table();
            table.add_row(vec!["Data directory".to_string(), data_dir.display().to_string()]);
            table.add_row(vec!["Backend".to_string(), config.backend.to_string()]);
            table.add_row(vec!["Locale".to_string(), config.locale.code().to_string()]);
            table.add_row(vec![
                "Export path".to_string(),
                config.export_path.display().to_string(),
            ]);
            table.add_row(vec![
                format!("Store URL ({})", ENV_STORE_URL[0]),
                config.store_url.clone().unwrap_or_else(|| "not set".to_string()),
            ]);
            table.add_row(vec![
                format!("Store key ({})", ENV_STORE_KEY[0]),
                key_state.to_string(),
            ]);
            println!("{}", table);

            if config.backend == Backend::Remote && config.remote_credentials().is_err() {
                warning(&format!(
                    "The remote backend needs {} and {} in the environment.",
                    ENV_STORE_URL[0], ENV_STORE_KEY[0]
                ));
            }
        }
        ConfigCommands::Set { key, value } => {
            // file values only, so environment overrides are not persisted
            let mut config = Config::load_with_env(&data_dir, |_| None)?;
            config.set(&key, &value)?;
            config.save(&data_dir)?;
            success(&format!("Set {} = {}", key, value));
            println!(
                "{}",
                "Environment variables still take precedence over saved settings.".dimmed()
            );
        }
    }

    Ok(())
}
