//! Agenda service - scheduled services and their billing status

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde_json::json;

use crate::domain::result::Result;
use crate::domain::{
    AgendaEntry, ClientId, ClientInput, DateRange, MonthlySummary, Service, ServiceId,
    ServiceInput, ServiceStatus,
};
use crate::ports::{Condition, Order, Select, Store, Table};

use super::clients::ClientService;
use super::rows::{
    agenda_entry_from_row, service_from_row, service_values, EMBEDDED_CLIENT_COLUMNS,
    SERVICE_COLUMNS,
};

/// Agenda service for scheduling, listing and billing services
pub struct AgendaService {
    store: Arc<dyn Store>,
    clients: ClientService,
}

impl AgendaService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            clients: ClientService::new(Arc::clone(&store)),
            store,
        }
    }

    /// Services ordered by date then time, with their client's details
    ///
    /// With a range only services dated in `[start, end)` are returned.
    pub fn list_services(&self, range: Option<DateRange>) -> Result<Vec<AgendaEntry>> {
        let mut query = Select::from(Table::Services)
            .columns(SERVICE_COLUMNS)
            .embed(Table::Clients, "client_id", EMBEDDED_CLIENT_COLUMNS)
            .order_by(Order::asc("service_date"))
            .order_by(Order::asc("service_time"));

        if let Some(range) = range {
            query = query
                .filter(Condition::Gte("service_date", json!(range.start.to_string())))
                .filter(Condition::Lt("service_date", json!(range.end.to_string())));
        }

        self.store
            .select(&query)?
            .iter()
            .map(agenda_entry_from_row)
            .collect()
    }

    /// Schedule a service and return its id
    ///
    /// Negative or non-finite amounts are rejected before the store is
    /// contacted.
    #[allow(clippy::too_many_arguments)]
    pub fn add_service(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        client_id: Option<ClientId>,
        service_type: &str,
        amount: f64,
        status: ServiceStatus,
        notes: &str,
    ) -> Result<ServiceId> {
        let input = ServiceInput::new(date, time, client_id, service_type, amount, status, notes)?;
        self.store.insert(Table::Services, service_values(&input))
    }

    /// Create a client and schedule a service for it
    ///
    /// Both inputs are validated before either insert.
    #[allow(clippy::too_many_arguments)]
    pub fn add_service_with_new_client(
        &self,
        client: &ClientInput,
        date: NaiveDate,
        time: NaiveTime,
        service_type: &str,
        amount: f64,
        status: ServiceStatus,
        notes: &str,
    ) -> Result<(ClientId, ServiceId)> {
        let mut input = ServiceInput::new(date, time, None, service_type, amount, status, notes)?;

        let client_id = self.clients.insert(client)?;
        input.client_id = Some(client_id);
        let service_id = self.store.insert(Table::Services, service_values(&input))?;

        Ok((client_id, service_id))
    }

    /// One service by id, `NotFound` when absent
    pub fn get_service(&self, id: ServiceId) -> Result<Service> {
        let query = Select::from(Table::Services)
            .columns(SERVICE_COLUMNS)
            .filter(Condition::Eq("id", json!(id)));
        service_from_row(&self.store.single(&query)?)
    }

    /// Overwrite every field of a service
    #[allow(clippy::too_many_arguments)]
    pub fn update_service(
        &self,
        id: ServiceId,
        date: NaiveDate,
        time: NaiveTime,
        client_id: Option<ClientId>,
        service_type: &str,
        amount: f64,
        status: ServiceStatus,
        notes: &str,
    ) -> Result<()> {
        let input = ServiceInput::new(date, time, client_id, service_type, amount, status, notes)?;
        self.store.update(
            Table::Services,
            &[Condition::Eq("id", json!(id))],
            service_values(&input),
        )?;
        Ok(())
    }

    pub fn delete_service(&self, id: ServiceId) -> Result<()> {
        self.store
            .delete(Table::Services, &[Condition::Eq("id", json!(id))])?;
        Ok(())
    }

    /// Paid and pending totals for the services in range
    pub fn summarize(&self, range: Option<DateRange>) -> Result<MonthlySummary> {
        let entries = self.list_services(range)?;
        Ok(MonthlySummary::from_entries(&entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::Error;
    use crate::services::testing::RecordingStore;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn setup() -> (Arc<RecordingStore>, AgendaService, ClientService) {
        let store = Arc::new(RecordingStore::new());
        let agenda = AgendaService::new(store.clone());
        let clients = ClientService::new(store.clone());
        (store, agenda, clients)
    }

    #[test]
    fn test_add_then_get_round_trip() {
        let (_, agenda, clients) = setup();
        let client_id = clients.add_client("Jane", "", "", "").unwrap();
        let id = agenda
            .add_service(
                d(2025, 3, 4),
                t(10, 0),
                Some(client_id),
                " Fumigación ",
                150.0,
                ServiceStatus::Pending,
                "",
            )
            .unwrap();

        let service = agenda.get_service(id).unwrap();
        assert_eq!(service.amount, 150.0);
        assert_eq!(service.status, ServiceStatus::Pending);
        assert_eq!(service.client_id, Some(client_id));
        assert_eq!(service.service_type, "Fumigación");
        assert_eq!(service.time, t(10, 0));
    }

    #[test]
    fn test_negative_amount_makes_no_store_call() {
        let (store, agenda, _) = setup();
        let err = agenda
            .add_service(d(2025, 3, 4), t(9, 0), None, "x", -5.0, ServiceStatus::Paid, "")
            .unwrap_err();
        assert!(err.is_validation());
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_list_services_ordered_and_ranged() {
        let (_, agenda, _) = setup();
        for (date, time) in [
            (d(2025, 3, 10), t(15, 0)),
            (d(2025, 2, 28), t(8, 0)),
            (d(2025, 3, 10), t(9, 0)),
            (d(2025, 4, 1), t(8, 0)),
            (d(2025, 3, 1), t(12, 0)),
        ] {
            agenda
                .add_service(date, time, None, "Control", 50.0, ServiceStatus::Pending, "")
                .unwrap();
        }

        let march = agenda.list_services(Some(DateRange::month(2025, 3).unwrap())).unwrap();
        let keys: Vec<(NaiveDate, NaiveTime)> =
            march.iter().map(|e| (e.service.date, e.service.time)).collect();
        assert_eq!(
            keys,
            vec![
                (d(2025, 3, 1), t(12, 0)),
                (d(2025, 3, 10), t(9, 0)),
                (d(2025, 3, 10), t(15, 0)),
            ]
        );

        assert_eq!(agenda.list_services(None).unwrap().len(), 5);
    }

    #[test]
    fn test_list_services_joins_client() {
        let (_, agenda, clients) = setup();
        let client_id = clients.add_client("María", "555-0101", "Calle 5", "").unwrap();
        agenda
            .add_service(d(2025, 3, 4), t(10, 0), Some(client_id), "x", 1.0, ServiceStatus::Paid, "")
            .unwrap();

        let entries = agenda.list_services(None).unwrap();
        assert_eq!(entries[0].client_name.as_deref(), Some("María"));
        assert_eq!(entries[0].client_address.as_deref(), Some("Calle 5"));
    }

    #[test]
    fn test_add_service_with_new_client() {
        let (store, agenda, clients) = setup();
        let client = ClientInput::new(" Taquería ", "", "", "").unwrap();

        let err = agenda
            .add_service_with_new_client(&client, d(2025, 3, 4), t(9, 0), "x", f64::NAN, ServiceStatus::Paid, "")
            .unwrap_err();
        assert!(err.is_validation());
        assert!(store.calls().is_empty());

        let (client_id, service_id) = agenda
            .add_service_with_new_client(&client, d(2025, 3, 4), t(9, 0), "x", 80.0, ServiceStatus::Paid, "")
            .unwrap();
        assert_eq!(clients.get_client(client_id).unwrap().name, "Taquería");
        assert_eq!(agenda.get_service(service_id).unwrap().client_id, Some(client_id));
    }

    #[test]
    fn test_update_and_delete_service() {
        let (_, agenda, _) = setup();
        let id = agenda
            .add_service(d(2025, 3, 4), t(9, 0), None, "x", 10.0, ServiceStatus::Pending, "")
            .unwrap();

        agenda
            .update_service(id, d(2025, 3, 5), t(11, 30), None, "y", 20.0, ServiceStatus::Paid, "done")
            .unwrap();
        let service = agenda.get_service(id).unwrap();
        assert_eq!(service.date, d(2025, 3, 5));
        assert_eq!(service.status, ServiceStatus::Paid);
        assert_eq!(service.notes.as_deref(), Some("done"));

        agenda.delete_service(id).unwrap();
        assert!(matches!(agenda.get_service(id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_summarize() {
        let (_, agenda, _) = setup();
        agenda.add_service(d(2025, 3, 4), t(9, 0), None, "x", 100.0, ServiceStatus::Paid, "").unwrap();
        agenda.add_service(d(2025, 3, 4), t(11, 0), None, "x", 200.0, ServiceStatus::Paid, "").unwrap();
        agenda.add_service(d(2025, 3, 20), t(9, 0), None, "x", 75.0, ServiceStatus::Pending, "").unwrap();
        agenda.add_service(d(2025, 4, 2), t(9, 0), None, "x", 999.0, ServiceStatus::Paid, "").unwrap();

        let summary = agenda.summarize(Some(DateRange::month(2025, 3).unwrap())).unwrap();
        assert_eq!(summary.paid_total, 300.0);
        assert_eq!(summary.pending_total, 75.0);
        assert_eq!(summary.service_count, 3);
    }
}
