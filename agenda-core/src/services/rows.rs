//! Mapping between store rows and domain records
//!
//! Store rows are loosely typed. Anything required that is missing or
//! unreadable fails the whole read with `Error::Store`.

use serde_json::{json, Value as JsonValue};

use crate::domain::result::{Error, Result};
use crate::domain::{
    non_blank, parse_date, parse_time, AgendaEntry, Client, ClientInput, Service, ServiceInput,
    ServiceStatus,
};
use crate::ports::{Row, Table};

pub(crate) const CLIENT_COLUMNS: &[&str] = &["id", "name", "phone", "address", "notes"];

pub(crate) const SERVICE_COLUMNS: &[&str] = &[
    "id",
    "service_date",
    "service_time",
    "client_id",
    "service_type",
    "amount",
    "status",
    "notes",
];

/// Client fields pulled into each agenda row
pub(crate) const EMBEDDED_CLIENT_COLUMNS: &[&str] = &["name", "phone", "address"];

pub(crate) fn client_from_row(row: &Row) -> Result<Client> {
    Ok(Client {
        id: required_i64(row, "id")?,
        name: required_str(row, "name")?,
        phone: optional_str(row, "phone"),
        address: optional_str(row, "address"),
        notes: optional_str(row, "notes"),
    })
}

pub(crate) fn service_from_row(row: &Row) -> Result<Service> {
    let date_text = required_str(row, "service_date")?;
    let time_text = required_str(row, "service_time")?;
    let status_text = required_str(row, "status")?;

    Ok(Service {
        id: required_i64(row, "id")?,
        date: parse_date(&date_text).map_err(|e| unreadable("service_date", e))?,
        time: parse_time(&time_text).map_err(|e| unreadable("service_time", e))?,
        client_id: optional_i64(row, "client_id")?,
        service_type: optional_str(row, "service_type").unwrap_or_default(),
        amount: amount(row)?,
        status: ServiceStatus::parse(&status_text)
            .ok_or_else(|| Error::store(format!("unknown service status '{}'", status_text)))?,
        notes: optional_str(row, "notes"),
    })
}

/// A service row carrying the embedded `clients` object
pub(crate) fn agenda_entry_from_row(row: &Row) -> Result<AgendaEntry> {
    let service = service_from_row(row)?;
    let client = row
        .get(Table::Clients.name())
        .and_then(JsonValue::as_object);

    let field = |name: &str| client.and_then(|c| optional_str(c, name));
    Ok(AgendaEntry {
        client_name: field("name"),
        client_phone: field("phone"),
        client_address: field("address"),
        service,
    })
}

pub(crate) fn client_values(input: &ClientInput) -> Row {
    object(json!({
        "name": input.name,
        "phone": input.phone,
        "address": input.address,
        "notes": input.notes,
    }))
}

pub(crate) fn service_values(input: &ServiceInput) -> Row {
    object(json!({
        "service_date": input.date.format("%Y-%m-%d").to_string(),
        "service_time": input.time_text(),
        "client_id": input.client_id,
        "service_type": input.service_type,
        "amount": input.amount,
        "status": input.status.as_str(),
        "notes": input.notes,
    }))
}

fn object(value: JsonValue) -> Row {
    match value {
        JsonValue::Object(map) => map,
        _ => Row::new(),
    }
}

fn unreadable(column: &str, error: Error) -> Error {
    Error::store(format!("unreadable '{}': {}", column, error))
}

fn missing(column: &str) -> Error {
    Error::store(format!("row is missing '{}'", column))
}

fn required_str(row: &Row, column: &str) -> Result<String> {
    match row.get(column) {
        Some(JsonValue::String(s)) => Ok(s.trim().to_string()),
        Some(JsonValue::Number(n)) => Ok(n.to_string()),
        _ => Err(missing(column)),
    }
}

fn optional_str(row: &Row, column: &str) -> Option<String> {
    let value = match row.get(column) {
        Some(JsonValue::String(s)) => Some(s.clone()),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    non_blank(value)
}

fn as_i64(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn required_i64(row: &Row, column: &str) -> Result<i64> {
    match row.get(column) {
        None | Some(JsonValue::Null) => Err(missing(column)),
        Some(value) => as_i64(value)
            .ok_or_else(|| Error::store(format!("'{}' is not an integer: {}", column, value))),
    }
}

fn optional_i64(row: &Row, column: &str) -> Result<Option<i64>> {
    match row.get(column) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => as_i64(value)
            .map(Some)
            .ok_or_else(|| Error::store(format!("'{}' is not an integer: {}", column, value))),
    }
}

/// Amounts arrive as numbers, or as strings from `numeric` columns
fn amount(row: &Row) -> Result<f64> {
    let value = match row.get("amount") {
        None | Some(JsonValue::Null) => return Ok(0.0),
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    value
        .filter(|a| a.is_finite())
        .ok_or_else(|| Error::store("'amount' is not a number"))
}
