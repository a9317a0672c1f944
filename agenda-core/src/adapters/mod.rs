//! Adapter implementations
//!
//! Adapters implement the `Store` port with concrete technologies:
//! - PostgREST over HTTP for the hosted database
//! - DuckDB for a local single-file database

pub mod duckdb;
pub mod postgrest;
