//! Service (appointment / work order) domain model

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::client::ClientId;
use super::result::{Error, Result};

/// Store-assigned service identifier
pub type ServiceId = i64;

/// Payment status of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceStatus {
    Pending,
    Paid,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 2] = [ServiceStatus::Pending, ServiceStatus::Paid];

    /// Value written to the store
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "Pending",
            ServiceStatus::Paid => "Paid",
        }
    }

    /// Parse a stored or user-supplied status
    ///
    /// Accepts the canonical values plus the Spanish labels found in
    /// older rows, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" | "pendiente" => Some(ServiceStatus::Pending),
            "paid" | "pagado" => Some(ServiceStatus::Paid),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::validation(format!("unknown status '{}'", s.trim())))
    }
}

/// A scheduled service with its billing status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Weak reference, cleared when the client is deleted
    pub client_id: Option<ClientId>,
    pub service_type: String,
    pub amount: f64,
    pub status: ServiceStatus,
    pub notes: Option<String>,
}

/// A service with the fields of its client pulled in
///
/// Client fields are `None` when the reference is null or dangling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgendaEntry {
    #[serde(flatten)]
    pub service: Service,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub client_address: Option<String>,
}

/// Validated service fields, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInput {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub client_id: Option<ClientId>,
    pub service_type: String,
    pub amount: f64,
    pub status: ServiceStatus,
    pub notes: String,
}

impl ServiceInput {
    /// Trim the text fields and reject negative or non-finite amounts
    pub fn new(
        date: NaiveDate,
        time: NaiveTime,
        client_id: Option<ClientId>,
        service_type: &str,
        amount: f64,
        status: ServiceStatus,
        notes: &str,
    ) -> Result<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::validation(format!(
                "amount must be a non-negative number, got {}",
                amount
            )));
        }

        Ok(Self {
            date,
            time,
            client_id,
            service_type: service_type.trim().to_string(),
            // normalizes -0.0
            amount: amount.abs(),
            status,
            notes: notes.trim().to_string(),
        })
    }

    /// Time formatted the way it is written to the store
    pub fn time_text(&self) -> String {
        format_time(self.time)
    }
}

/// Parse a calendar date
///
/// Accepts `YYYY-MM-DD` and `DD/MM/YYYY`. Anything after the date part
/// (`T10:00:00+00:00`, ` 00:00:00`) is ignored, so store values carrying an
/// incidental time component normalize to a pure date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    let date_part = trimmed
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trimmed);

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
        .map_err(|_| Error::validation(format!("invalid date '{}', use YYYY-MM-DD", trimmed)))
}

/// Parse a 24-hour time, `HH:MM` or `HH:MM:SS`
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f"))
        .map_err(|_| Error::validation(format!("invalid time '{}', use HH:MM", trimmed)))
}

/// Format a time as `HH:MM`
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_status_parse_accepts_legacy_labels() {
        assert_eq!(ServiceStatus::parse("Pending"), Some(ServiceStatus::Pending));
        assert_eq!(ServiceStatus::parse("pagado"), Some(ServiceStatus::Paid));
        assert_eq!(ServiceStatus::parse(" Pendiente "), Some(ServiceStatus::Pending));
        assert_eq!(ServiceStatus::parse("PAID"), Some(ServiceStatus::Paid));
        assert_eq!(ServiceStatus::parse("cancelled"), None);
    }

    #[test]
    fn test_status_from_str_is_validation_error() {
        let err = "maybe".parse::<ServiceStatus>().unwrap_err();
        assert!(err.is_validation());
        assert_eq!("paid".parse::<ServiceStatus>().unwrap(), ServiceStatus::Paid);
    }

    #[test]
    fn test_input_trims_and_keeps_amount() {
        let input = ServiceInput::new(
            d(2025, 3, 4),
            t(9, 30),
            Some(3),
            "  Fumigación general ",
            150.0,
            ServiceStatus::Pending,
            " back yard ",
        )
        .unwrap();
        assert_eq!(input.service_type, "Fumigación general");
        assert_eq!(input.notes, "back yard");
        assert_eq!(input.amount, 150.0);
        assert_eq!(input.time_text(), "09:30");
    }

    #[test]
    fn test_input_rejects_bad_amounts() {
        let make = |amount: f64| {
            ServiceInput::new(d(2025, 3, 4), t(9, 0), None, "x", amount, ServiceStatus::Paid, "")
        };
        assert!(make(-1.0).unwrap_err().is_validation());
        assert!(make(f64::NAN).is_err());
        assert!(make(f64::INFINITY).is_err());
        assert_eq!(make(0.0).unwrap().amount, 0.0);
        assert!(make(-0.0).unwrap().amount.is_sign_positive());
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2025-03-15").unwrap(), d(2025, 3, 15));
        assert_eq!(parse_date("15/03/2025").unwrap(), d(2025, 3, 15));
        assert_eq!(parse_date("2025-03-15T00:00:00+00:00").unwrap(), d(2025, 3, 15));
        assert_eq!(parse_date("2025-03-15 00:00:00").unwrap(), d(2025, 3, 15));
        assert!(parse_date("2025-13-01").unwrap_err().is_validation());
        assert!(parse_date("tomorrow").is_err());
    }

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(parse_time("10:00").unwrap(), t(10, 0));
        assert_eq!(parse_time("17:45:00").unwrap(), t(17, 45));
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("noon").unwrap_err().is_validation());
        assert_eq!(format_time(t(7, 5)), "07:05");
    }
}
