//! Store double for service unit tests

use std::sync::Mutex;

use crate::adapters::duckdb::LocalStore;
use crate::domain::result::Result;
use crate::ports::{Condition, Row, Select, Store, Table};

/// In-memory store that records every call it receives
pub(crate) struct RecordingStore {
    inner: LocalStore,
    calls: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: LocalStore::open_in_memory().expect("in-memory store"),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls so far, as `"<verb> <table>"`
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, verb: &str, table: Table) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", verb, table.name()));
    }
}

impl Store for RecordingStore {
    fn name(&self) -> &str {
        "recording"
    }

    fn select(&self, query: &Select) -> Result<Vec<Row>> {
        self.record("select", query.table);
        self.inner.select(query)
    }

    fn single(&self, query: &Select) -> Result<Row> {
        self.record("single", query.table);
        self.inner.single(query)
    }

    fn insert(&self, table: Table, values: Row) -> Result<i64> {
        self.record("insert", table);
        self.inner.insert(table, values)
    }

    fn update(&self, table: Table, filters: &[Condition], values: Row) -> Result<usize> {
        self.record("update", table);
        self.inner.update(table, filters, values)
    }

    fn delete(&self, table: Table, filters: &[Condition]) -> Result<usize> {
        self.record("delete", table);
        self.inner.delete(table, filters)
    }
}
