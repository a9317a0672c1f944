//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod agenda;
mod clients;
pub mod logging;
pub mod migration;
pub mod report;
mod rows;

#[cfg(test)]
pub(crate) mod testing;

pub use agenda::AgendaService;
pub use clients::ClientService;
pub use logging::{LogEntry, LogEvent, LogStats, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use report::{build_workbook, ExportResult, ReportService};
