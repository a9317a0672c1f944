//! Display labels for reports and tables

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};
use super::service::ServiceStatus;

/// Language used for column headers and status labels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "en",
        }
    }

    /// Agenda columns: date, time, client, phone, address, type, amount,
    /// status, notes
    pub fn service_headers(&self) -> [&'static str; 9] {
        match self {
            Locale::Es => [
                "Fecha",
                "Hora",
                "Cliente",
                "Teléfono",
                "Dirección",
                "Servicio",
                "Monto",
                "Estatus",
                "Observaciones",
            ],
            Locale::En => [
                "Date", "Time", "Client", "Phone", "Address", "Service", "Amount", "Status", "Notes",
            ],
        }
    }

    /// Client columns: name, phone, address, notes
    pub fn client_headers(&self) -> [&'static str; 4] {
        match self {
            Locale::Es => ["Cliente", "Teléfono", "Dirección", "Notas"],
            Locale::En => ["Client", "Phone", "Address", "Notes"],
        }
    }

    pub fn status_label(&self, status: ServiceStatus) -> &'static str {
        match (self, status) {
            (Locale::Es, ServiceStatus::Pending) => "Pendiente",
            (Locale::Es, ServiceStatus::Paid) => "Pagado",
            (Locale::En, ServiceStatus::Pending) => "Pending",
            (Locale::En, ServiceStatus::Paid) => "Paid",
        }
    }

    /// Month name, 1-based
    pub fn month_name(&self, month: u32) -> &'static str {
        const ES: [&str; 12] = [
            "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio", "Julio", "Agosto",
            "Septiembre", "Octubre", "Noviembre", "Diciembre",
        ];
        const EN: [&str; 12] = [
            "January", "February", "March", "April", "May", "June", "July", "August",
            "September", "October", "November", "December",
        ];
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            Locale::Es => ES[idx],
            Locale::En => EN[idx],
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "es" | "es-mx" | "es_mx" | "spanish" => Ok(Locale::Es),
            "en" | "en-us" | "en_us" | "english" => Ok(Locale::En),
            other => Err(Error::validation(format!("unsupported locale '{}'", other))),
        }
    }
}
