//! Agenda Core - Scheduling and billing logic for a service business
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Client, Service, DateRange, etc.)
//! - **ports**: Trait definitions for external dependencies (Store)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (PostgREST, DuckDB)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod migrations;
pub mod log_migrations;
pub mod workbook;

use std::path::Path;
use std::sync::Arc;

use adapters::duckdb::LocalStore;
use adapters::postgrest::RemoteStore;
use config::{Backend, Config};
use ports::Store;
use services::*;

// Re-export commonly used types at crate root
pub use domain::{
    AgendaEntry, AgendaFilter, Client, ClientId, DateRange, Locale, MonthlySummary, Service,
    ServiceId, ServiceStatus,
};
pub use domain::result::{Error, Result};

/// File name of the local store inside the data directory
pub const LOCAL_DB_FILE: &str = "agenda.duckdb";

/// Main context for agenda operations
///
/// This is the primary entry point for all business logic. It holds
/// the store handle, configuration, and all services.
pub struct AgendaContext {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub client_service: ClientService,
    pub agenda_service: AgendaService,
    pub report_service: ReportService,
}

impl AgendaContext {
    /// Create a context for the backend configured in `data_dir`
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;

        let store: Arc<dyn Store> = match config.backend {
            Backend::Remote => {
                let (url, key) = config.remote_credentials()?;
                Arc::new(RemoteStore::new(url, key)?)
            }
            Backend::Local => {
                std::fs::create_dir_all(data_dir)?;
                Arc::new(LocalStore::open(&data_dir.join(LOCAL_DB_FILE))?)
            }
        };

        Ok(Self::with_store(config, store))
    }

    /// Wire every service to an existing store
    pub fn with_store(config: Config, store: Arc<dyn Store>) -> Self {
        let client_service = ClientService::new(Arc::clone(&store));
        let agenda_service = AgendaService::new(Arc::clone(&store));
        let report_service =
            ReportService::new(Arc::clone(&store), config.export_path.clone(), config.locale);

        Self {
            config,
            store,
            client_service,
            agenda_service,
            report_service,
        }
    }
}
