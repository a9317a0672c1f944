//! Store port - table-oriented access to the remote data store
//!
//! Rows travel as loosely-typed JSON maps. The service layer maps them into
//! domain records; adapters only know about tables, columns and filters.

use serde_json::{Map, Value as JsonValue};

use crate::domain::result::Result;

/// A row as returned by the store, keyed by column name
pub type Row = Map<String, JsonValue>;

/// Tables known to the agenda
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Clients,
    Services,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Clients => "clients",
            Table::Services => "services",
        }
    }
}

/// A single-column predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(&'static str, JsonValue),
    Gte(&'static str, JsonValue),
    Lt(&'static str, JsonValue),
}

impl Condition {
    pub fn column(&self) -> &'static str {
        match self {
            Condition::Eq(c, _) | Condition::Gte(c, _) | Condition::Lt(c, _) => c,
        }
    }

    pub fn value(&self) -> &JsonValue {
        match self {
            Condition::Eq(_, v) | Condition::Gte(_, v) | Condition::Lt(_, v) => v,
        }
    }
}

/// Sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub descending: bool,
}

impl Order {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// A related row pulled in through a foreign key
///
/// The related columns come back nested under the table's name, e.g.
/// `{"id": 1, ..., "clients": {"name": "..."}}`, or `null` when the key is
/// null or points nowhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub table: Table,
    pub foreign_key: &'static str,
    pub columns: Vec<&'static str>,
}

/// A read request against one table
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: Table,
    /// Empty selects every column
    pub columns: Vec<&'static str>,
    /// All conditions must hold
    pub filters: Vec<Condition>,
    pub order: Vec<Order>,
    pub embed: Option<Embed>,
}

impl Select {
    pub fn from(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            embed: None,
        }
    }

    pub fn columns(mut self, columns: &[&'static str]) -> Self {
        self.columns = columns.to_vec();
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.filters.push(condition);
        self
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    pub fn embed(mut self, table: Table, foreign_key: &'static str, columns: &[&'static str]) -> Self {
        self.embed = Some(Embed {
            table,
            foreign_key,
            columns: columns.to_vec(),
        });
        self
    }
}

/// Generic data store
///
/// Implementations: the hosted PostgREST endpoint and a local DuckDB file.
/// Calls are synchronous; each one is a single round trip with no
/// transaction spanning calls.
pub trait Store: Send + Sync {
    /// Backend name (e.g., "postgrest", "duckdb")
    fn name(&self) -> &str;

    /// Fetch every row matching the request
    fn select(&self, query: &Select) -> Result<Vec<Row>>;

    /// Fetch exactly one row
    ///
    /// Zero or several matches is `Error::NotFound`.
    fn single(&self, query: &Select) -> Result<Row>;

    /// Insert a row and return the id the store assigned
    fn insert(&self, table: Table, values: Row) -> Result<i64>;

    /// Overwrite the given columns on every matching row
    ///
    /// Returns the number of rows changed where the backend reports it.
    fn update(&self, table: Table, filters: &[Condition], values: Row) -> Result<usize>;

    /// Delete every matching row
    fn delete(&self, table: Table, filters: &[Condition]) -> Result<usize>;
}
