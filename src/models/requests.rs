//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use std::time::Duration;

use serde::Deserialize;

use crate::cache::{Data, Item, MAX_KEY_LENGTH, NAMESPACE_SEPARATOR};

/// Request body for storing one item (PUT /items)
///
/// # Fields
/// - `key`: The cache key
/// - `data`: Any JSON value; omitting it stores an undefined value
/// - `ttl`: Optional lifetime in milliseconds, 0 or absent never expires
/// - `namespace`: Optional namespace, defaults to `default`
#[derive(Debug, Clone, Deserialize)]
pub struct SetItemRequest {
    pub key: String,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl SetItemRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key).or_else(|| validate_namespace(self.namespace.as_deref()))
    }

    pub fn into_item(self) -> Item {
        let mut item = Item::new(self.key, self.data)
            .ttl(Duration::from_millis(self.ttl.unwrap_or(0)));
        if let Some(namespace) = self.namespace {
            item = item.namespace(namespace);
        }
        item
    }
}

/// Request body for batch reads and removals (POST /batch/get, /batch/remove)
#[derive(Debug, Clone, Deserialize)]
pub struct KeysRequest {
    pub keys: Vec<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl KeysRequest {
    pub fn validate(&self) -> Option<String> {
        self.keys
            .iter()
            .find_map(|key| validate_key(key))
            .or_else(|| validate_namespace(self.namespace.as_deref()))
    }
}

/// Query string selecting a namespace (`?namespace=...`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamespaceQuery {
    pub namespace: Option<String>,
}

impl NamespaceQuery {
    pub fn validate(&self) -> Option<String> {
        validate_namespace(self.namespace.as_deref())
    }
}

fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Namespaces may not contain the separator, or clearing one could match
/// keys of another.
pub fn validate_namespace(namespace: Option<&str>) -> Option<String> {
    match namespace {
        Some("") => Some("Namespace cannot be empty".to_string()),
        Some(ns) if ns.contains(NAMESPACE_SEPARATOR) => Some(format!(
            "Namespace cannot contain '{}'",
            NAMESPACE_SEPARATOR
        )),
        _ => None,
    }
}
