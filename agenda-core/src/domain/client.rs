//! Client domain model

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Store-assigned client identifier
pub type ClientId = i64;

/// A customer of the business
///
/// Optional text fields are `None` when the store holds null or an empty
/// string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Trimmed and validated client fields, ready to be written
///
/// Used for both inserts and full-field updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInput {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub notes: String,
}

impl ClientInput {
    /// Trim every field and reject a name that is empty after trimming
    pub fn new(name: &str, phone: &str, address: &str, notes: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("client name is required"));
        }

        Ok(Self {
            name: name.to_string(),
            phone: phone.trim().to_string(),
            address: address.trim().to_string(),
            notes: notes.trim().to_string(),
        })
    }
}

/// Map an optional store string to `None` when it is blank
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
