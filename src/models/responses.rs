//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::HashMap;

use serde::Serialize;

use crate::cache::{CacheStats, Data, DEFAULT_NAMESPACE};
use crate::sync::SaveOutcome;

/// Response body for a single read (GET /items/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub namespace: String,
    /// `null` for both JSON null and undefined values
    pub data: Data,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, namespace: Option<String>, data: Data) -> Self {
        Self {
            key: key.into(),
            namespace: namespace.unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            data,
        }
    }
}

/// Response body for writes (PUT /items, PUT /batch/set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// Number of items stored
    pub stored: usize,
}

impl SetResponse {
    pub fn single(key: &str) -> Self {
        Self {
            message: format!("Key '{}' set successfully", key),
            stored: 1,
        }
    }

    pub fn batch(stored: usize) -> Self {
        Self {
            message: format!("{} keys set successfully", stored),
            stored,
        }
    }
}

/// Response body for a single removal (DELETE /items/:key)
#[derive(Debug, Clone, Serialize)]
pub struct RemoveResponse {
    pub key: String,
    /// Whether the key existed
    pub removed: bool,
    /// The value that was removed, null when absent
    pub data: Option<Data>,
}

impl RemoveResponse {
    pub fn new(key: impl Into<String>, data: Option<Data>) -> Self {
        Self {
            key: key.into(),
            removed: data.is_some(),
            data,
        }
    }
}

/// Response body for batch reads and removals
#[derive(Debug, Clone, Serialize)]
pub struct ManyResponse {
    /// Key to value; absent keys map to null
    pub items: HashMap<String, Option<Data>>,
}

impl ManyResponse {
    pub fn new(items: HashMap<String, Option<Data>>) -> Self {
        Self { items }
    }
}

/// Response body for clear operations
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// Entries left in the cache
    pub remaining: usize,
}

impl ClearResponse {
    pub fn namespace(namespace: &str, remaining: usize) -> Self {
        Self {
            message: format!("Namespace '{}' cleared", namespace),
            remaining,
        }
    }

    pub fn all() -> Self {
        Self {
            message: "Cache cleared".to_string(),
            remaining: 0,
        }
    }
}

/// Response body for an on-demand save (POST /flush)
#[derive(Debug, Clone, Serialize)]
pub struct FlushResponse {
    /// `saved`, `abandoned`, `failed` or `skipped`
    pub outcome: &'static str,
    /// Entries written, when saved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
    pub attempts: u32,
}

impl From<SaveOutcome> for FlushResponse {
    fn from(outcome: SaveOutcome) -> Self {
        match outcome {
            SaveOutcome::Saved { entries, attempts } => Self {
                outcome: "saved",
                entries: Some(entries),
                attempts,
            },
            SaveOutcome::Abandoned { attempts } => Self {
                outcome: "abandoned",
                entries: None,
                attempts,
            },
            SaveOutcome::Failed => Self {
                outcome: "failed",
                entries: None,
                attempts: 0,
            },
            SaveOutcome::Skipped => Self {
                outcome: "skipped",
                entries: None,
                attempts: 0,
            },
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub total_entries: usize,
    pub capacity: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(stats: &CacheStats, capacity: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
            capacity,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Whether a durable store is configured
    pub persistent: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy(persistent: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            persistent,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
