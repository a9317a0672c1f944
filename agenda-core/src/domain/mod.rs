//! Core domain entities
//!
//! Pure data structures with validation logic - no I/O or external
//! dependencies.

pub mod agenda;
mod client;
mod locale;
mod period;
pub mod result;
mod service;

pub use agenda::{AgendaFilter, DailyCount, MonthlySummary};
pub use client::{Client, ClientId, ClientInput};
pub(crate) use client::non_blank;
pub use locale::Locale;
pub use period::{month_bounds, DateRange};
pub use service::{
    format_time, parse_date, parse_time, AgendaEntry, Service, ServiceId, ServiceInput,
    ServiceStatus,
};
