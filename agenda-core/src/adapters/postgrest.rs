//! PostgREST store client
//!
//! Talks to a hosted Supabase/PostgREST endpoint over its REST surface:
//! `GET /rest/v1/<table>?select=...&<col>=eq.<v>&order=<col>.asc` and the
//! matching POST/PATCH/DELETE verbs.

use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde_json::Value as JsonValue;

use crate::domain::result::{Error, Result};
use crate::ports::{Condition, Row, Select, Store, Table};

/// Per-request timeout
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Media type asking PostgREST for exactly one object instead of an array
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Client for a PostgREST-compatible store
#[derive(Debug)]
pub struct RemoteStore {
    client: Client,
    rest_url: String,
    api_key: String,
}

impl RemoteStore {
    /// Create a client for the project at `base_url`
    ///
    /// Accepts either the project URL (`https://xyz.supabase.co`) or the
    /// REST root (`.../rest/v1`).
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(Error::config("store URL cannot be empty"));
        }
        if api_key.trim().is_empty() {
            return Err(Error::config("store API key cannot be empty"));
        }
        url::Url::parse(base_url)
            .map_err(|e| Error::config(format!("invalid store URL '{}': {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")
            .map_err(|e| Error::config(format!("{:#}", e)))?;

        Ok(Self {
            client,
            rest_url: rest_url(base_url),
            api_key: api_key.trim().to_string(),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}", self.rest_url, table.name())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorized(request)
            .send()
            .map_err(map_request_error)?;
        check_response_status(response)
    }

    fn rows(&self, response: Response) -> Result<Vec<Row>> {
        response
            .json::<Vec<Row>>()
            .map_err(|e| Error::store(format!("unreadable store response: {}", e)))
    }
}

impl Store for RemoteStore {
    fn name(&self) -> &str {
        "postgrest"
    }

    fn select(&self, query: &Select) -> Result<Vec<Row>> {
        let request = self
            .client
            .get(self.table_url(query.table))
            .query(&select_pairs(query));
        let response = self.send(request)?;
        self.rows(response)
    }

    fn single(&self, query: &Select) -> Result<Row> {
        let request = self
            .client
            .get(self.table_url(query.table))
            .header("Accept", SINGLE_OBJECT)
            .query(&select_pairs(query));
        let response = self.send(request)?;
        response
            .json::<Row>()
            .map_err(|e| Error::store(format!("unreadable store response: {}", e)))
    }

    fn insert(&self, table: Table, values: Row) -> Result<i64> {
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&values);
        let response = self.send(request)?;
        let rows = self.rows(response)?;

        rows.first()
            .and_then(|row| row.get("id"))
            .and_then(JsonValue::as_i64)
            .ok_or_else(|| Error::store(format!("insert into {} returned no id", table.name())))
    }

    fn update(&self, table: Table, filters: &[Condition], values: Row) -> Result<usize> {
        let request = self
            .client
            .patch(self.table_url(table))
            .header("Prefer", "return=representation")
            .query(&filter_pairs(filters))
            .json(&values);
        let response = self.send(request)?;
        Ok(self.rows(response)?.len())
    }

    fn delete(&self, table: Table, filters: &[Condition]) -> Result<usize> {
        let request = self
            .client
            .delete(self.table_url(table))
            .header("Prefer", "return=representation")
            .query(&filter_pairs(filters));
        let response = self.send(request)?;
        Ok(self.rows(response)?.len())
    }
}

/// REST root for a project or REST URL
fn rest_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/rest/v1") {
        trimmed.to_string()
    } else {
        format!("{}/rest/v1", trimmed)
    }
}

/// Query string for a select: `select`, one pair per filter, then `order`
fn select_pairs(query: &Select) -> Vec<(String, String)> {
    let mut columns = if query.columns.is_empty() {
        "*".to_string()
    } else {
        query.columns.join(",")
    };
    if let Some(embed) = &query.embed {
        columns.push_str(&format!(",{}({})", embed.table.name(), embed.columns.join(",")));
    }

    let mut pairs = vec![("select".to_string(), columns)];
    pairs.extend(filter_pairs(&query.filters));

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| format!("{}.{}", o.column, if o.descending { "desc" } else { "asc" }))
            .collect::<Vec<_>>()
            .join(",");
        pairs.push(("order".to_string(), order));
    }

    pairs
}

fn filter_pairs(filters: &[Condition]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|condition| {
            let operand = match condition {
                Condition::Eq(_, JsonValue::Null) => "is.null".to_string(),
                Condition::Eq(_, v) => format!("eq.{}", operand_text(v)),
                Condition::Gte(_, v) => format!("gte.{}", operand_text(v)),
                Condition::Lt(_, v) => format!("lt.{}", operand_text(v)),
            };
            (condition.column().to_string(), operand)
        })
        .collect()
}

fn operand_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Map request errors to user-friendly messages
fn map_request_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::store(format!(
            "store request timed out after {} seconds",
            REQUEST_TIMEOUT_SECS
        ))
    } else if error.is_connect() {
        Error::store("unable to connect to the store")
    } else {
        Error::store(format!("store request failed: {}", error))
    }
}

/// Check response status and return appropriate errors
fn check_response_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(status_error(status, &error_message(&body)))
}

/// Error for a failed response; 406 means the single-object request did not
/// match exactly one row
fn status_error(status: StatusCode, detail: &str) -> Error {
    match status {
        StatusCode::NOT_ACCEPTABLE => {
            Error::not_found(format!("expected exactly one row: {}", detail))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::store(format!(
            "store rejected the API key (HTTP {}): {}",
            status.as_u16(),
            detail
        )),
        _ => Error::store(format!("store error HTTP {}: {}", status.as_u16(), detail)),
    }
}

/// PostgREST error bodies carry a `message` field; fall back to the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<JsonValue>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(JsonValue::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Order;
    use serde_json::json;

    #[test]
    fn test_reject_empty_credentials() {
        let err = RemoteStore::new("", "key").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = RemoteStore::new("https://example.supabase.co", "  ").unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_reject_invalid_url() {
        assert!(RemoteStore::new("not a url", "key").is_err());
    }

    #[test]
    fn test_rest_url_normalization() {
        assert_eq!(rest_url("https://x.supabase.co"), "https://x.supabase.co/rest/v1");
        assert_eq!(rest_url("https://x.supabase.co/"), "https://x.supabase.co/rest/v1");
        assert_eq!(rest_url("http://localhost:3000/rest/v1/"), "http://localhost:3000/rest/v1");
    }

    #[test]
    fn test_table_url() {
        let store = RemoteStore::new("https://x.supabase.co/", "key").unwrap();
        assert_eq!(store.table_url(Table::Services), "https://x.supabase.co/rest/v1/services");
        assert_eq!(store.name(), "postgrest");
    }

    #[test]
    fn test_select_pairs_with_range_and_embed() {
        let query = Select::from(Table::Services)
            .columns(&["id", "service_date", "service_time"])
            .filter(Condition::Gte("service_date", json!("2025-03-01")))
            .filter(Condition::Lt("service_date", json!("2025-04-01")))
            .order_by(Order::asc("service_date"))
            .order_by(Order::asc("service_time"))
            .embed(Table::Clients, "client_id", &["name", "phone", "address"]);

        let pairs = select_pairs(&query);
        assert_eq!(
            pairs,
            vec![
                (
                    "select".to_string(),
                    "id,service_date,service_time,clients(name,phone,address)".to_string()
                ),
                ("service_date".to_string(), "gte.2025-03-01".to_string()),
                ("service_date".to_string(), "lt.2025-04-01".to_string()),
                ("order".to_string(), "service_date.asc,service_time.asc".to_string()),
            ]
        );
    }

    #[test]
    fn test_select_all_columns() {
        let pairs = select_pairs(&Select::from(Table::Clients).order_by(Order::desc("name")));
        assert_eq!(pairs[0], ("select".to_string(), "*".to_string()));
        assert_eq!(pairs[1], ("order".to_string(), "name.desc".to_string()));
    }

    #[test]
    fn test_filter_operands() {
        let pairs = filter_pairs(&[
            Condition::Eq("id", json!(42)),
            Condition::Eq("client_id", JsonValue::Null),
        ]);
        assert_eq!(pairs[0], ("id".to_string(), "eq.42".to_string()));
        assert_eq!(pairs[1], ("client_id".to_string(), "is.null".to_string()));
    }

    #[test]
    fn test_status_error_mapping() {
        let err = status_error(StatusCode::NOT_ACCEPTABLE, "multiple (or no) rows returned");
        assert!(matches!(err, Error::NotFound(_)));
        assert!(err.to_string().contains("multiple (or no) rows"));

        let err = status_error(StatusCode::UNAUTHORIZED, "Invalid API key");
        assert!(matches!(err, Error::Store(_)));
        assert!(err.to_string().contains("HTTP 401"));

        let err = status_error(StatusCode::FORBIDDEN, "denied");
        assert!(matches!(err, Error::Store(_)));

        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(err.to_string(), "Store error: store error HTTP 500: boom");
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert!(error_message(body).starts_with("JSON object requested"));
        assert_eq!(error_message(" plain failure \n"), "plain failure");
    }
}
