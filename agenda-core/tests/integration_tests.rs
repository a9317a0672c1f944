//! Integration tests for agenda-core services
//!
//! These tests run the services against a real DuckDB store through the
//! `Store` port, the same way the CLI does with the local backend.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tempfile::TempDir;
use zip::ZipArchive;

use agenda_core::adapters::duckdb::LocalStore;
use agenda_core::config::{Backend, Config};
use agenda_core::domain::{month_bounds, ClientInput};
use agenda_core::ports::Store;
use agenda_core::services::{AgendaService, ClientService, ReportService};
use agenda_core::{AgendaContext, AgendaFilter, DateRange, Error, Locale, ServiceStatus};

// ============================================================================
// Test Helpers
// ============================================================================

/// Create a file-backed store with schema initialized
fn create_test_store(temp_dir: &TempDir) -> Arc<dyn Store> {
    let db_path = temp_dir.path().join("test.duckdb");
    Arc::new(LocalStore::open(&db_path).expect("Failed to open store"))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Read one part of an XLSX archive as text
fn read_part(path: &Path, name: &str) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut content = String::new();
    part.read_to_string(&mut content).unwrap();
    content
}

/// Schedule the March 2025 fixture: two paid (100 + 200) and one pending (75)
fn schedule_march(agenda: &AgendaService, clients: &ClientService) {
    let jane = clients.add_client("Jane Doe", "555-0100", "Elm 12", "").unwrap();
    let cafe = clients.add_client("Café Luna", "", "Av. Juárez 3", "cocina").unwrap();

    agenda
        .add_service(date(2025, 3, 3), time(9, 0), Some(jane), "Fumigación", 100.0, ServiceStatus::Paid, "")
        .unwrap();
    agenda
        .add_service(date(2025, 3, 3), time(14, 30), Some(cafe), "Control de roedores", 200.0, ServiceStatus::Paid, "")
        .unwrap();
    agenda
        .add_service(date(2025, 3, 31), time(8, 0), None, "Revisión", 75.0, ServiceStatus::Pending, "sin cliente")
        .unwrap();

    // Neighbours on both sides of the month
    agenda
        .add_service(date(2025, 2, 28), time(23, 59), Some(jane), "Fumigación", 500.0, ServiceStatus::Paid, "")
        .unwrap();
    agenda
        .add_service(date(2025, 4, 1), time(0, 0), Some(cafe), "Fumigación", 600.0, ServiceStatus::Pending, "")
        .unwrap();
}

// ============================================================================
// Client Tests
// ============================================================================

#[test]
fn test_add_client_stores_trimmed_name() {
    let temp_dir = TempDir::new().unwrap();
    let clients = ClientService::new(create_test_store(&temp_dir));

    let id = clients.add_client("  Jane  ", "", "", "").unwrap();
    assert_eq!(clients.get_client(id).unwrap().name, "Jane");

    let err = clients.add_client("   ", "", "", "").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(clients.list_clients().unwrap().len(), 1);
}

/// Deleting a client unlinks its services and deletes none of them
#[test]
fn test_delete_client_unlinks_services() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let clients = ClientService::new(Arc::clone(&store));
    let agenda = AgendaService::new(Arc::clone(&store));

    let doomed = clients.add_client("Doomed", "", "", "").unwrap();
    let other = clients.add_client("Other", "", "", "").unwrap();
    for day in 1..=4 {
        agenda
            .add_service(date(2025, 5, day), time(9, 0), Some(doomed), "x", 10.0, ServiceStatus::Pending, "")
            .unwrap();
    }
    agenda
        .add_service(date(2025, 5, 9), time(9, 0), Some(other), "x", 10.0, ServiceStatus::Pending, "")
        .unwrap();

    clients.delete_client(doomed).unwrap();

    let entries = agenda.list_services(None).unwrap();
    assert_eq!(entries.len(), 5);
    let unlinked = entries.iter().filter(|e| e.service.client_id.is_none()).count();
    assert_eq!(unlinked, 4);
    assert!(entries.iter().all(|e| e.client_name.as_deref() != Some("Doomed")));
    assert!(matches!(clients.get_client(doomed), Err(Error::NotFound(_))));
    assert_eq!(clients.get_client(other).unwrap().name, "Other");
}

/// A client deleted elsewhere leaves a dangling reference that still lists
#[test]
fn test_dangling_client_reference_lists_without_client() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let agenda = AgendaService::new(Arc::clone(&store));

    agenda
        .add_service(date(2025, 6, 1), time(9, 0), Some(9999), "x", 10.0, ServiceStatus::Paid, "")
        .unwrap();

    let entries = agenda.list_services(None).unwrap();
    assert_eq!(entries[0].service.client_id, Some(9999));
    assert_eq!(entries[0].client_name, None);
}

// ============================================================================
// Service Tests
// ============================================================================

#[test]
fn test_add_service_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let clients = ClientService::new(Arc::clone(&store));
    let agenda = AgendaService::new(store);

    let client_id = clients.add_client("Jane", "", "", "").unwrap();
    let id = agenda
        .add_service(date(2025, 3, 4), time(10, 15), Some(client_id), "Fumigación", 150.0, ServiceStatus::Pending, "")
        .unwrap();

    let service = agenda.get_service(id).unwrap();
    assert_eq!(service.amount, 150.0);
    assert_eq!(service.status, ServiceStatus::Pending);
    assert_eq!(service.client_id, Some(client_id));
    assert_eq!(service.date, date(2025, 3, 4));
    assert_eq!(service.time, time(10, 15));
}

#[test]
fn test_list_services_never_leaves_range() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let agenda = AgendaService::new(Arc::clone(&store));
    schedule_march(&agenda, &ClientService::new(store));

    for month in 1..=12 {
        let range = DateRange::month(2025, month).unwrap();
        let (start, end) = month_bounds(2025, month).unwrap();
        for entry in agenda.list_services(Some(range)).unwrap() {
            assert!(entry.service.date >= start && entry.service.date < end);
        }
    }

    let march = agenda.list_services(Some(DateRange::month(2025, 3).unwrap())).unwrap();
    assert_eq!(march.len(), 3);
    assert_eq!(march[0].client_name.as_deref(), Some("Jane Doe"));
    assert_eq!(march[2].client_name, None);
}

#[test]
fn test_filter_and_summary_for_month() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let agenda = AgendaService::new(Arc::clone(&store));
    schedule_march(&agenda, &ClientService::new(store));

    let range = DateRange::month(2025, 3).unwrap();
    let summary = agenda.summarize(Some(range)).unwrap();
    assert_eq!(summary.paid_total, 300.0);
    assert_eq!(summary.pending_total, 75.0);
    assert_eq!(summary.service_count, 3);
    assert_eq!(summary.per_day.len(), 2);
    assert_eq!(summary.per_day[0].services, 2);

    let entries = agenda.list_services(Some(range)).unwrap();
    let cafe = AgendaFilter::new().with_client_search("café");
    assert_eq!(cafe.apply(entries.clone()).len(), 1);

    let pending = AgendaFilter::new().with_statuses([ServiceStatus::Pending]);
    let pending = pending.apply(entries);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].service.amount, 75.0);
}

#[test]
fn test_new_client_flow_links_service() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let clients = ClientService::new(Arc::clone(&store));
    let agenda = AgendaService::new(store);

    let input = ClientInput::new("Hotel Sol", "555-0199", "Playa 1", "").unwrap();
    let (client_id, service_id) = agenda
        .add_service_with_new_client(&input, date(2025, 7, 1), time(7, 0), "Termitas", 900.0, ServiceStatus::Pending, "")
        .unwrap();

    assert_eq!(clients.get_client(client_id).unwrap().phone.as_deref(), Some("555-0199"));
    let entries = agenda.list_services(None).unwrap();
    assert_eq!(entries[0].service.id, service_id);
    assert_eq!(entries[0].client_name.as_deref(), Some("Hotel Sol"));
}

#[test]
fn test_data_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let clients = ClientService::new(create_test_store(&temp_dir));
        clients.add_client("Persisted", "", "", "").unwrap();
    }
    let clients = ClientService::new(create_test_store(&temp_dir));
    assert_eq!(clients.list_clients().unwrap()[0].name, "Persisted");
}

// ============================================================================
// Export Tests
// ============================================================================

#[test]
fn test_export_month_workbook() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    schedule_march(&AgendaService::new(Arc::clone(&store)), &ClientService::new(Arc::clone(&store)));

    let output = temp_dir.path().join("export_agenda.xlsx");
    let report = ReportService::new(store, output.clone(), Locale::Es);
    let result = report
        .export_spreadsheet(Some(DateRange::month(2025, 3).unwrap()))
        .unwrap();
    assert_eq!(result.path, output);
    assert_eq!(result.services, 3);
    assert_eq!(result.clients, 2);

    let workbook = read_part(&output, "xl/workbook.xml");
    assert!(workbook.contains(r#"name="Agenda""#));
    assert!(workbook.contains(r#"name="Clientes""#));

    let agenda = read_part(&output, "xl/worksheets/sheet1.xml");
    assert_eq!(agenda.matches("<row ").count(), 4);
    for header in Locale::Es.service_headers() {
        assert!(agenda.contains(&format!("<t>{}</t>", header)), "missing {}", header);
    }
    for field in ["service_date", "service_time", "client_id", "service_type", "notes"] {
        assert!(!agenda.contains(field), "internal field {} leaked", field);
    }
    assert!(agenda.contains("<t>Pagado</t>"));
    assert!(agenda.contains("<t>Pendiente</t>"));

    let clients = read_part(&output, "xl/worksheets/sheet2.xml");
    assert_eq!(clients.matches("<row ").count(), 3);
    assert!(clients.contains("Café Luna"));
}

#[test]
fn test_export_overwrites_previous_file() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let output = temp_dir.path().join("nested").join("report.xlsx");
    let report = ReportService::new(Arc::clone(&store), output.clone(), Locale::En);

    report.export_spreadsheet(None).unwrap();
    let empty = read_part(&output, "xl/worksheets/sheet1.xml");
    assert_eq!(empty.matches("<row ").count(), 1);
    assert!(empty.contains("<t>Amount</t>"));

    ClientService::new(Arc::clone(&store)).add_client("Late", "", "", "").unwrap();
    AgendaService::new(store)
        .add_service(date(2025, 1, 2), time(9, 0), None, "x", 1.0, ServiceStatus::Paid, "")
        .unwrap();
    report.export_spreadsheet(None).unwrap();

    let full = read_part(&output, "xl/worksheets/sheet1.xml");
    assert_eq!(full.matches("<row ").count(), 2);

    let leftovers: Vec<_> = std::fs::read_dir(output.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1);
}

// ============================================================================
// Context Tests
// ============================================================================

#[test]
fn test_context_wires_local_backend() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        backend: Backend::Local,
        export_path: temp_dir.path().join("out.xlsx"),
        ..Config::default()
    };
    let context = AgendaContext::with_store(config, create_test_store(&temp_dir));

    let id = context.client_service.add_client("Shared", "", "", "").unwrap();
    context
        .agenda_service
        .add_service(date(2025, 3, 1), time(9, 0), Some(id), "x", 5.0, ServiceStatus::Paid, "")
        .unwrap();

    let result = context.report_service.export_spreadsheet(None).unwrap();
    assert_eq!(result.services, 1);
    assert_eq!(context.store.name(), "duckdb");
}
