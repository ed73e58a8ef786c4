//! Recipient record

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One recipient of a bulk send: a flat mapping of field name to value.
///
/// `email` is the only field the sender relies on; every other field is only
/// used for template substitution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientRecord(HashMap<String, String>);

impl RecipientRecord {
    /// Create a record holding just an email address and a display name.
    pub fn new(email: &str, name: &str) -> Self {
        Self::default().with_field("email", email).with_field("name", name)
    }

    /// Return the record with `key` set to `value`.
    pub fn with_field(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// The email field, or an empty string if absent.
    pub fn email(&self) -> &str {
        self.get("email").unwrap_or_default()
    }

    /// The name field, or an empty string if absent.
    pub fn name(&self) -> &str {
        self.get("name").unwrap_or_default()
    }
}

impl FromIterator<(String, String)> for RecipientRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
