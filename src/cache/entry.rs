//! Cache Entry Module
//!
//! Defines the stored payload type and the per-entry TTL metadata.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// == Data ==
/// An opaque cached value.
///
/// `Undefined` is kept apart from JSON `null` so that a value explicitly
/// stored as "nothing" reads back as such after a persistence round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Data {
    #[default]
    Undefined,
    Json(Value),
}

impl Data {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Data::Undefined)
    }

    /// Borrows the JSON value, if any.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Data::Undefined => None,
            Data::Json(value) => Some(value),
        }
    }
}

impl From<Value> for Data {
    fn from(value: Value) -> Self {
        Data::Json(value)
    }
}

impl From<Option<Value>> for Data {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Data::Undefined, Data::Json)
    }
}

impl Serialize for Data {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Data::Undefined => serializer.serialize_unit(),
            Data::Json(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Data {
    /// A present field is always JSON, `null` included. Absence is handled by
    /// `#[serde(default)]` on the containing field.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Data::Json)
    }
}

// == Cache Entry ==
/// A stored value with its write time and TTL.
///
/// Serialized as `{"data", "writtenAt", "ttl"}`; `data` is omitted when
/// undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// The stored value
    #[serde(default, skip_serializing_if = "Data::is_undefined")]
    pub data: Data,
    /// Write timestamp (Unix milliseconds)
    pub written_at: u64,
    /// Lifetime in milliseconds, 0 = never expires
    #[serde(default)]
    pub ttl: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry written now.
    ///
    /// # Arguments
    /// * `data` - The value to store
    /// * `ttl` - Lifetime in milliseconds, 0 for no expiry
    pub fn new(data: Data, ttl: u64) -> Self {
        Self {
            data,
            written_at: current_timestamp_ms(),
            ttl,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is stale at `now` (Unix milliseconds).
    ///
    /// Boundary condition: the entry expires once `now - written_at` reaches
    /// `ttl`. A zero TTL never expires.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.ttl > 0 && now.saturating_sub(self.written_at) >= self.ttl
    }

    /// Checks whether the entry is stale right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if the entry never expires.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` once the TTL has elapsed
    /// - `Some(remaining)` while the entry is live
    /// - `None` for entries without TTL
    pub fn ttl_remaining(&self) -> Option<Duration> {
        if self.ttl == 0 {
            return None;
        }
        let expires = self.written_at.saturating_add(self.ttl);
        let remaining = expires.saturating_sub(current_timestamp_ms());
        Some(Duration::from_millis(remaining))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch reads as 0.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new(json!("test_value").into(), 0);

        assert_eq!(entry.data, Data::Json(json!("test_value")));
        assert!(entry.ttl_remaining().is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new(json!(42).into(), 60_000);

        assert!(!entry.is_expired());
        let remaining = entry.ttl_remaining().unwrap();
        assert!(remaining <= Duration::from_secs(60));
        assert!(remaining >= Duration::from_secs(59));
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(json!("soon").into(), 50);

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(80));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry {
            data: Data::Undefined,
            written_at: 10_000,
            ttl: 1_000,
        };

        assert!(!entry.is_expired_at(10_999));
        assert!(entry.is_expired_at(11_000), "Entry should be expired at boundary");
        assert!(entry.is_expired_at(20_000));
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let entry = CacheEntry {
            data: Data::Undefined,
            written_at: 0,
            ttl: 0,
        };

        assert!(!entry.is_expired_at(u64::MAX));
    }

    #[test]
    fn test_clock_behind_write_time_is_live() {
        let entry = CacheEntry {
            data: Data::Undefined,
            written_at: 5_000,
            ttl: 100,
        };

        assert!(!entry.is_expired_at(1_000));
    }

    #[test]
    fn test_entry_wire_format() {
        let entry = CacheEntry {
            data: Data::Json(json!({"a": [1, 2]})),
            written_at: 1_700_000_000_000,
            ttl: 500,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            json!({"data": {"a": [1, 2]}, "writtenAt": 1_700_000_000_000u64, "ttl": 500})
        );
    }

    #[test]
    fn test_undefined_and_null_stay_distinct() {
        let undefined = CacheEntry {
            data: Data::Undefined,
            written_at: 1,
            ttl: 0,
        };
        let null = CacheEntry {
            data: Data::Json(Value::Null),
            written_at: 1,
            ttl: 0,
        };

        let undefined_text = serde_json::to_string(&undefined).unwrap();
        let null_text = serde_json::to_string(&null).unwrap();
        assert!(!undefined_text.contains("data"));
        assert!(null_text.contains("\"data\":null"));

        let undefined_back: CacheEntry = serde_json::from_str(&undefined_text).unwrap();
        let null_back: CacheEntry = serde_json::from_str(&null_text).unwrap();
        assert_eq!(undefined_back.data, Data::Undefined);
        assert_eq!(null_back.data, Data::Json(Value::Null));
    }

    #[test]
    fn test_data_from_option() {
        assert_eq!(Data::from(None), Data::Undefined);
        assert_eq!(Data::from(Some(json!(true))), Data::Json(json!(true)));
        assert_eq!(Data::Json(json!(1)).as_json(), Some(&json!(1)));
        assert!(Data::Undefined.as_json().is_none());
    }
}
