//! Client service - client records

use std::sync::Arc;

use serde_json::{json, Value as JsonValue};

use crate::domain::result::Result;
use crate::domain::{Client, ClientId, ClientInput};
use crate::ports::{Condition, Order, Row, Select, Store, Table};

use super::rows::{client_from_row, client_values, CLIENT_COLUMNS};

/// Client service for adding, editing and removing clients
pub struct ClientService {
    store: Arc<dyn Store>,
}

impl ClientService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// All clients, sorted by name
    pub fn list_clients(&self) -> Result<Vec<Client>> {
        let query = Select::from(Table::Clients)
            .columns(CLIENT_COLUMNS)
            .order_by(Order::asc("name"));

        self.store
            .select(&query)?
            .iter()
            .map(client_from_row)
            .collect()
    }

    /// One client by id, `NotFound` when absent
    pub fn get_client(&self, id: ClientId) -> Result<Client> {
        let query = Select::from(Table::Clients)
            .columns(CLIENT_COLUMNS)
            .filter(Condition::Eq("id", json!(id)));
        client_from_row(&self.store.single(&query)?)
    }

    /// Add a client and return its id
    ///
    /// A blank name is rejected before the store is contacted.
    pub fn add_client(&self, name: &str, phone: &str, address: &str, notes: &str) -> Result<ClientId> {
        let input = ClientInput::new(name, phone, address, notes)?;
        self.insert(&input)
    }

    pub(crate) fn insert(&self, input: &ClientInput) -> Result<ClientId> {
        self.store.insert(Table::Clients, client_values(input))
    }

    /// Overwrite every field of a client
    ///
    /// An unknown id is not an error; nothing is changed.
    pub fn update_client(
        &self,
        id: ClientId,
        name: &str,
        phone: &str,
        address: &str,
        notes: &str,
    ) -> Result<()> {
        let input = ClientInput::new(name, phone, address, notes)?;
        self.store.update(
            Table::Clients,
            &[Condition::Eq("id", json!(id))],
            client_values(&input),
        )?;
        Ok(())
    }

    /// Delete a client, keeping its services
    ///
    /// Services pointing at the client have their reference cleared first;
    /// the two steps are separate round trips with no transaction, so a
    /// failure in between leaves unlinked services and a live client.
    /// Repeating the delete completes it. Returns the number of services
    /// unlinked where the store reports it.
    pub fn delete_client(&self, id: ClientId) -> Result<usize> {
        let mut unlink = Row::new();
        unlink.insert("client_id".to_string(), JsonValue::Null);

        let unlinked = self.store.update(
            Table::Services,
            &[Condition::Eq("client_id", json!(id))],
            unlink,
        )?;
        self.store
            .delete(Table::Clients, &[Condition::Eq("id", json!(id))])?;
        Ok(unlinked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::Error;
    use crate::services::testing::RecordingStore;

    fn setup() -> (Arc<RecordingStore>, ClientService) {
        let store = Arc::new(RecordingStore::new());
        let service = ClientService::new(store.clone());
        (store, service)
    }

    #[test]
    fn test_add_client_trims_name() {
        let (_, service) = setup();
        let id = service.add_client("  Jane  ", " 555 ", "", "").unwrap();

        let client = service.get_client(id).unwrap();
        assert_eq!(client.name, "Jane");
        assert_eq!(client.phone.as_deref(), Some("555"));
        assert_eq!(client.address, None);
    }

    #[test]
    fn test_blank_name_makes_no_store_call() {
        let (store, service) = setup();
        let err = service.add_client("   ", "555", "x", "y").unwrap_err();
        assert!(err.is_validation());
        assert!(store.calls().is_empty());

        let err = service.update_client(1, "", "", "", "").unwrap_err();
        assert!(err.is_validation());
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_list_clients_sorted_by_name() {
        let (_, service) = setup();
        service.add_client("Zapata", "", "", "").unwrap();
        service.add_client("Alvarez", "", "", "").unwrap();
        service.add_client("Mendoza", "", "", "").unwrap();

        let names: Vec<String> = service.list_clients().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Alvarez", "Mendoza", "Zapata"]);
    }

    #[test]
    fn test_update_client_overwrites_all_fields() {
        let (_, service) = setup();
        let id = service.add_client("Jane", "555", "Main St", "dog").unwrap();
        service.update_client(id, " Janet ", "", "Oak Ave", "").unwrap();

        let client = service.get_client(id).unwrap();
        assert_eq!(client.name, "Janet");
        assert_eq!(client.phone, None);
        assert_eq!(client.address.as_deref(), Some("Oak Ave"));
        assert_eq!(client.notes, None);
    }

    #[test]
    fn test_update_unknown_client_is_ok() {
        let (_, service) = setup();
        service.update_client(404, "Nobody", "", "", "").unwrap();
        assert!(service.list_clients().unwrap().is_empty());
    }

    #[test]
    fn test_delete_client_unlinks_then_deletes() {
        let (store, service) = setup();
        let id = service.add_client("Jane", "", "", "").unwrap();
        service.delete_client(id).unwrap();

        let calls = store.calls();
        assert_eq!(&calls[calls.len() - 2..], ["update services", "delete clients"]);
        assert!(matches!(service.get_client(id), Err(Error::NotFound(_))));
    }
}
