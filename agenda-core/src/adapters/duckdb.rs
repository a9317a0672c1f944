//! DuckDB store implementation
//!
//! A local, single-file store with the same two tables as the hosted
//! database. Used for offline work and for integration tests.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, bail, Result};
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::{Connection, ToSql};
use serde_json::Value as JsonValue;

use crate::domain::result::{Error, Result as StoreResult};
use crate::migrations::MIGRATIONS;
use crate::ports::{Condition, Order, Row, Select, Store, Table};
use crate::services::{MigrationResult, MigrationService};

/// Prefix for joined columns before they are folded into the embed object
const EMBED_PREFIX: &str = "__embed_";

/// DuckDB-backed store
pub struct LocalStore {
    conn: Mutex<Connection>,
}

impl LocalStore {
    /// Open (or create) the store file and apply pending migrations
    pub fn open(db_path: &Path) -> StoreResult<Self> {
        let config = duckdb::Config::default()
            .enable_autoload_extension(false)
            .map_err(|e| Error::store(e.to_string()))?;
        let conn = Connection::open_with_flags(db_path, config).map_err(|e| {
            Error::store(format!("failed to open {}: {}", db_path.display(), e))
        })?;
        Self::with_connection(conn)
    }

    /// A throwaway store living only in memory
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::store(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations().map_err(store_error)?;
        Ok(store)
    }

    /// Apply any pending schema migrations
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn, MIGRATIONS).run_pending()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {}", e))
    }

    fn query_rows(&self, query: &Select) -> Result<Vec<Row>> {
        let (sql, params) = build_select(query)?;
        let conn = self.lock()?;

        let param_refs: Vec<&dyn ToSql> = params.iter().map(|b| b.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let mut result_rows = stmt.query(param_refs.as_slice())?;

        let mut raw_rows: Vec<Vec<JsonValue>> = Vec::new();
        let mut column_count = 0;
        while let Some(row) = result_rows.next()? {
            if raw_rows.is_empty() {
                column_count = row.as_ref().column_count();
            }
            raw_rows.push((0..column_count).map(|i| get_column_value(row, i)).collect());
        }
        drop(result_rows);

        let columns: Vec<String> = (0..column_count)
            .map(|i| {
                stmt.column_name(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| format!("col{}", i))
            })
            .collect();

        Ok(raw_rows
            .into_iter()
            .map(|values| assemble_row(&columns, values, query))
            .collect())
    }

    fn insert_row(&self, table: Table, values: Row) -> Result<i64> {
        if values.is_empty() {
            bail!("insert into {} has no values", table.name());
        }

        let mut columns = Vec::with_capacity(values.len());
        let mut params = Vec::with_capacity(values.len());
        for (column, value) in &values {
            columns.push(quote_ident(column)?);
            params.push(json_to_duckdb_param(value));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
            quote_ident(table.name())?,
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        );

        let conn = self.lock()?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|b| b.as_ref()).collect();
        let id: i64 = conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;
        Ok(id)
    }

    fn update_rows(&self, table: Table, filters: &[Condition], values: Row) -> Result<usize> {
        if values.is_empty() {
            return Ok(0);
        }

        let mut assignments = Vec::with_capacity(values.len());
        let mut params = Vec::with_capacity(values.len() + filters.len());
        for (column, value) in &values {
            assignments.push(format!("{} = ?", quote_ident(column)?));
            params.push(json_to_duckdb_param(value));
        }
        let (where_sql, filter_params) = build_where(filters, None)?;
        params.extend(filter_params);

        let sql = format!(
            "UPDATE {} SET {}{}",
            quote_ident(table.name())?,
            assignments.join(", "),
            where_sql
        );

        let conn = self.lock()?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|b| b.as_ref()).collect();
        Ok(conn.execute(&sql, param_refs.as_slice())?)
    }

    fn delete_rows(&self, table: Table, filters: &[Condition]) -> Result<usize> {
        let (where_sql, params) = build_where(filters, None)?;
        let sql = format!("DELETE FROM {}{}", quote_ident(table.name())?, where_sql);

        let conn = self.lock()?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|b| b.as_ref()).collect();
        Ok(conn.execute(&sql, param_refs.as_slice())?)
    }
}

impl Store for LocalStore {
    fn name(&self) -> &str {
        "duckdb"
    }

    fn select(&self, query: &Select) -> StoreResult<Vec<Row>> {
        self.query_rows(query).map_err(store_error)
    }

    fn single(&self, query: &Select) -> StoreResult<Row> {
        let mut rows = self.query_rows(query).map_err(store_error)?;
        if rows.len() != 1 {
            return Err(Error::not_found(format!(
                "expected exactly one row in {}, found {}",
                query.table.name(),
                rows.len()
            )));
        }
        Ok(rows.remove(0))
    }

    fn insert(&self, table: Table, values: Row) -> StoreResult<i64> {
        self.insert_row(table, values).map_err(store_error)
    }

    fn update(&self, table: Table, filters: &[Condition], values: Row) -> StoreResult<usize> {
        self.update_rows(table, filters, values).map_err(store_error)
    }

    fn delete(&self, table: Table, filters: &[Condition]) -> StoreResult<usize> {
        self.delete_rows(table, filters).map_err(store_error)
    }
}

fn store_error(error: anyhow::Error) -> Error {
    Error::store(format!("{:#}", error))
}

/// Quote a column or table name, accepting only plain identifiers
fn quote_ident(name: &str) -> Result<String> {
    let valid = !name.is_empty()
        && name
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false)
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        bail!("invalid identifier '{}'", name);
    }
    Ok(format!("\"{}\"", name))
}

fn build_select(query: &Select) -> Result<(String, Vec<Box<dyn ToSql>>)> {
    let base = "t";
    let mut select_list: Vec<String> = if query.columns.is_empty() {
        vec![format!("{}.*", base)]
    } else {
        query
            .columns
            .iter()
            .map(|c| Ok(format!("{}.{}", base, quote_ident(c)?)))
            .collect::<Result<_>>()?
    };

    let mut from = format!("{} AS {}", quote_ident(query.table.name())?, base);
    if let Some(embed) = &query.embed {
        // the joined id tells a dangling reference apart from a row of nulls
        select_list.push(format!("e.\"id\" AS \"{}id\"", EMBED_PREFIX));
        for column in &embed.columns {
            select_list.push(format!(
                "e.{} AS \"{}{}\"",
                quote_ident(column)?,
                EMBED_PREFIX,
                column
            ));
        }
        from.push_str(&format!(
            " LEFT JOIN {} AS e ON e.\"id\" = {}.{}",
            quote_ident(embed.table.name())?,
            base,
            quote_ident(embed.foreign_key)?
        ));
    }

    let (where_sql, params) = build_where(&query.filters, Some(base))?;
    let mut sql = format!("SELECT {} FROM {}{}", select_list.join(", "), from, where_sql);

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o: &Order| {
                Ok(format!(
                    "{}.{} {}",
                    base,
                    quote_ident(o.column)?,
                    if o.descending { "DESC" } else { "ASC" }
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        sql.push_str(&format!(" ORDER BY {}", order.join(", ")));
    }

    Ok((sql, params))
}

fn build_where(
    filters: &[Condition],
    alias: Option<&str>,
) -> Result<(String, Vec<Box<dyn ToSql>>)> {
    if filters.is_empty() {
        return Ok((String::new(), Vec::new()));
    }

    let mut clauses = Vec::with_capacity(filters.len());
    let mut params = Vec::with_capacity(filters.len());
    for condition in filters {
        let column = match alias {
            Some(a) => format!("{}.{}", a, quote_ident(condition.column())?),
            None => quote_ident(condition.column())?,
        };
        match condition {
            Condition::Eq(_, JsonValue::Null) => {
                clauses.push(format!("{} IS NULL", column));
                continue;
            }
            Condition::Eq(..) => clauses.push(format!("{} = ?", column)),
            Condition::Gte(..) => clauses.push(format!("{} >= ?", column)),
            Condition::Lt(..) => clauses.push(format!("{} < ?", column)),
        }
        params.push(json_to_duckdb_param(condition.value()));
    }

    Ok((format!(" WHERE {}", clauses.join(" AND ")), params))
}

/// Fold `__embed_*` columns into a nested object keyed by the embedded table
fn assemble_row(columns: &[String], values: Vec<JsonValue>, query: &Select) -> Row {
    let mut row = Row::new();
    let mut embedded = Row::new();
    let mut embed_present = false;

    for (column, value) in columns.iter().zip(values) {
        match column.strip_prefix(EMBED_PREFIX) {
            Some("id") => embed_present = !value.is_null(),
            Some(inner) => {
                embedded.insert(inner.to_string(), value);
            }
            None => {
                row.insert(column.clone(), value);
            }
        }
    }

    if let Some(embed) = &query.embed {
        let nested = if embed_present {
            JsonValue::Object(embedded)
        } else {
            JsonValue::Null
        };
        row.insert(embed.table.name().to_string(), nested);
    }

    row
}

/// Convert JSON value to DuckDB parameter
fn json_to_duckdb_param(value: &JsonValue) -> Box<dyn ToSql> {
    match value {
        JsonValue::Null => Box::new(None::<String>),
        JsonValue::Bool(b) => Box::new(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Box::new(i)
            } else if let Some(f) = n.as_f64() {
                Box::new(f)
            } else {
                Box::new(n.to_string())
            }
        }
        JsonValue::String(s) => Box::new(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => Box::new(value.to_string()),
    }
}

fn get_column_value(row: &duckdb::Row, idx: usize) -> JsonValue {
    match row.get_ref(idx) {
        Ok(ValueRef::Null) => JsonValue::Null,
        Ok(ValueRef::Boolean(b)) => JsonValue::Bool(b),
        Ok(ValueRef::TinyInt(i)) => serde_json::json!(i),
        Ok(ValueRef::SmallInt(i)) => serde_json::json!(i),
        Ok(ValueRef::Int(i)) => serde_json::json!(i),
        Ok(ValueRef::BigInt(i)) => serde_json::json!(i),
        Ok(ValueRef::HugeInt(i)) => serde_json::json!(i.to_string()),
        Ok(ValueRef::UTinyInt(i)) => serde_json::json!(i),
        Ok(ValueRef::USmallInt(i)) => serde_json::json!(i),
        Ok(ValueRef::UInt(i)) => serde_json::json!(i),
        Ok(ValueRef::UBigInt(i)) => serde_json::json!(i),
        Ok(ValueRef::Float(f)) => serde_json::json!(f),
        Ok(ValueRef::Double(f)) => serde_json::json!(f),
        Ok(ValueRef::Decimal(d)) => {
            let s = d.to_string();
            match s.parse::<f64>() {
                Ok(f) => serde_json::json!(f),
                Err(_) => JsonValue::String(s),
            }
        }
        Ok(ValueRef::Text(bytes)) => JsonValue::String(String::from_utf8_lossy(bytes).to_string()),
        Ok(ValueRef::Date32(days)) => chrono::NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(days as i64)))
            .map(|date| JsonValue::String(date.to_string()))
            .unwrap_or(JsonValue::Null),
        Ok(ValueRef::Time64(unit, t)) => {
            let micros = match unit {
                TimeUnit::Second => t * 1_000_000,
                TimeUnit::Millisecond => t * 1_000,
                TimeUnit::Microsecond => t,
                TimeUnit::Nanosecond => t / 1_000,
            };
            let secs = (micros / 1_000_000) as u32;
            chrono::NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)
                .map(|time| JsonValue::String(time.format("%H:%M:%S").to_string()))
                .unwrap_or(JsonValue::Null)
        }
        Ok(ValueRef::Timestamp(_, ts)) => chrono::DateTime::from_timestamp_micros(ts)
            .map(|dt| JsonValue::String(dt.to_rfc3339()))
            .unwrap_or_else(|| serde_json::json!(ts)),
        _ => JsonValue::Null,
    }
}
