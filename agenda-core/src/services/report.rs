//! Report service - spreadsheet export of the agenda and client list

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::domain::result::{Error, Result};
use crate::domain::{format_time, AgendaEntry, Client, DateRange, Locale};
use crate::ports::Store;
use crate::workbook::{Cell, Sheet, Workbook};

use super::agenda::AgendaService;
use super::clients::ClientService;

pub const AGENDA_SHEET: &str = "Agenda";
pub const CLIENTS_SHEET: &str = "Clientes";

/// Outcome of an export
#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub path: PathBuf,
    pub services: usize,
    pub clients: usize,
}

/// Report service for spreadsheet exports
pub struct ReportService {
    agenda: AgendaService,
    clients: ClientService,
    export_path: PathBuf,
    locale: Locale,
}

impl ReportService {
    pub fn new(store: Arc<dyn Store>, export_path: PathBuf, locale: Locale) -> Self {
        Self {
            agenda: AgendaService::new(Arc::clone(&store)),
            clients: ClientService::new(store),
            export_path,
            locale,
        }
    }

    /// Export to the configured path, replacing any previous report
    pub fn export_spreadsheet(&self, range: Option<DateRange>) -> Result<ExportResult> {
        self.export_spreadsheet_to(range, &self.export_path)
    }

    /// Export services in `range` plus every client to `path`
    ///
    /// The file is written next to its destination and renamed into place,
    /// so an existing report is replaced whole or not at all.
    pub fn export_spreadsheet_to(&self, range: Option<DateRange>, path: &Path) -> Result<ExportResult> {
        let entries = self.agenda.list_services(range)?;
        let clients = self.clients.list_clients()?;
        let workbook = build_workbook(&entries, &clients, self.locale)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        workbook.write_to(tmp.as_file_mut())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;

        Ok(ExportResult {
            path: path.to_path_buf(),
            services: entries.len(),
            clients: clients.len(),
        })
    }
}

/// Lay out the two report sheets with display headers
pub fn build_workbook(entries: &[AgendaEntry], clients: &[Client], locale: Locale) -> Result<Workbook> {
    let mut agenda = Sheet::new(AGENDA_SHEET, &locale.service_headers());
    for entry in entries {
        let service = &entry.service;
        agenda.push_row(vec![
            Cell::Date(service.date),
            Cell::text(format_time(service.time)),
            Cell::optional_text(entry.client_name.as_deref()),
            Cell::optional_text(entry.client_phone.as_deref()),
            Cell::optional_text(entry.client_address.as_deref()),
            Cell::text(service.service_type.as_str()),
            Cell::Money(service.amount),
            Cell::text(locale.status_label(service.status)),
            Cell::optional_text(service.notes.as_deref()),
        ]);
    }

    let mut client_sheet = Sheet::new(CLIENTS_SHEET, &locale.client_headers());
    for client in clients {
        client_sheet.push_row(vec![
            Cell::text(client.name.as_str()),
            Cell::optional_text(client.phone.as_deref()),
            Cell::optional_text(client.address.as_deref()),
            Cell::optional_text(client.notes.as_deref()),
        ]);
    }

    let mut workbook = Workbook::new();
    workbook.add_sheet(agenda)?;
    workbook.add_sheet(client_sheet)?;
    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::domain::{Service, ServiceStatus};

    fn entry(amount: f64, status: ServiceStatus) -> AgendaEntry {
        AgendaEntry {
            service: Service {
                id: 1,
                date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
                time: NaiveTime::from_hms_opt(9, 5, 0).unwrap(),
                client_id: None,
                service_type: "Fumigación".to_string(),
                amount,
                status,
                notes: None,
            },
            client_name: None,
            client_phone: None,
            client_address: None,
        }
    }

    #[test]
    fn test_build_workbook_layout() {
        let workbook = build_workbook(
            &[entry(100.0, ServiceStatus::Paid), entry(75.0, ServiceStatus::Pending)],
            &[],
            Locale::Es,
        )
        .unwrap();

        let sheets = workbook.sheets();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].name(), "Agenda");
        assert_eq!(sheets[1].name(), "Clientes");
        assert_eq!(sheets[0].headers()[6], "Monto");
        assert_eq!(sheets[0].rows().len(), 2);
        assert!(sheets[1].rows().is_empty());

        let row = &sheets[0].rows()[1];
        assert_eq!(row[1], Cell::text("09:05"));
        assert_eq!(row[2], Cell::Empty);
        assert_eq!(row[6], Cell::Money(75.0));
        assert_eq!(row[7], Cell::text("Pendiente"));
    }

    #[test]
    fn test_sheet_names_do_not_follow_locale() {
        let workbook = build_workbook(&[], &[], Locale::En).unwrap();
        assert_eq!(workbook.sheets()[1].name(), "Clientes");
        assert_eq!(workbook.sheets()[1].headers()[0], "Client");
    }
}
