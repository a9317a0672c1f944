//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "backend": "remote",
//!   "exportPath": "export_agenda.xlsx",
//!   "locale": "es"
//! }
//! ```
//! Store credentials never touch the file; they come from the environment.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::Locale;

pub const SETTINGS_FILE: &str = "settings.json";

/// Default report file, relative to the working directory
pub const DEFAULT_EXPORT_PATH: &str = "export_agenda.xlsx";

/// Environment variables, in lookup order where there are fallbacks
pub const ENV_BACKEND: &str = "AGENDA_BACKEND";
pub const ENV_LOCALE: &str = "AGENDA_LOCALE";
pub const ENV_EXPORT_PATH: &str = "AGENDA_EXPORT_PATH";
pub const ENV_STORE_URL: [&str; 2] = ["AGENDA_STORE_URL", "SUPABASE_URL"];
pub const ENV_STORE_KEY: [&str; 2] = ["AGENDA_STORE_KEY", "SUPABASE_KEY"];

/// Which store the agenda talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Hosted PostgREST endpoint
    #[default]
    Remote,
    /// DuckDB file in the data directory
    Local,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Remote => "remote",
            Backend::Local => "local",
        })
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "supabase" | "postgrest" => Ok(Backend::Remote),
            "local" | "duckdb" => Ok(Backend::Local),
            other => Err(Error::config(format!(
                "unknown backend '{}', expected 'remote' or 'local'",
                other
            ))),
        }
    }
}

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    backend: Option<Backend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    export_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    locale: Option<Locale>,
    /// Keys this version does not manage, kept on save
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Agenda configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub export_path: PathBuf,
    pub locale: Locale,
    pub store_url: Option<String>,
    pub store_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            locale: Locale::default(),
            store_url: None,
            store_key: None,
        }
    }
}

impl Config {
    /// Load settings from the data directory and apply environment overrides
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_with_env(data_dir, |name| std::env::var(name).ok())
    }

    /// Same as `load`, reading variables through `lookup`
    pub fn load_with_env(data_dir: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw = read_settings(data_dir)?;
        let env = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let backend = match env(ENV_BACKEND) {
            Some(value) => value.parse()?,
            None => raw.backend.unwrap_or_default(),
        };
        let locale = match env(ENV_LOCALE) {
            Some(value) => value.parse()?,
            None => raw.locale.unwrap_or_default(),
        };
        let export_path = env(ENV_EXPORT_PATH)
            .or(raw.export_path)
            .unwrap_or_else(|| DEFAULT_EXPORT_PATH.to_string());

        Ok(Self {
            backend,
            locale,
            export_path: PathBuf::from(export_path),
            store_url: ENV_STORE_URL.iter().find_map(|name| env(*name)),
            store_key: ENV_STORE_KEY.iter().find_map(|name| env(*name)),
        })
    }

    /// Save the file-backed settings, preserving keys this version doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let mut settings = read_settings(data_dir)?;
        settings.backend = Some(self.backend);
        settings.locale = Some(self.locale);
        settings.export_path = Some(self.export_path.to_string_lossy().into_owned());

        std::fs::create_dir_all(data_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(data_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    /// Change one setting by its settings.json key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "backend" => self.backend = value.parse()?,
            "locale" => self.locale = value.parse()?,
            "exportPath" | "export-path" | "export_path" => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(Error::config("export path cannot be empty"));
                }
                self.export_path = PathBuf::from(value);
            }
            other => {
                return Err(Error::config(format!(
                    "unknown setting '{}', expected backend, locale or exportPath",
                    other
                )))
            }
        }
        Ok(())
    }

    /// URL and key for the remote store
    pub fn remote_credentials(&self) -> Result<(&str, &str)> {
        match (self.store_url.as_deref(), self.store_key.as_deref()) {
            (Some(url), Some(key)) => Ok((url, key)),
            _ => Err(Error::config(format!(
                "remote store needs {} and {} in the environment",
                ENV_STORE_URL[0], ENV_STORE_KEY[0]
            ))),
        }
    }
}

fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
    let settings_path = data_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }

    let content = std::fs::read_to_string(&settings_path)?;
    serde_json::from_str(&content).map_err(|e| {
        Error::config(format!("{} is not valid: {}", settings_path.display(), e))
    })
}
