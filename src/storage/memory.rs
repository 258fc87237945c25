//! In-memory durable store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{check_quota, DurableStore, StoreError};

/// A [`DurableStore`] backed by a `HashMap`, with an optional per-key quota.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects any payload larger than `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Stores `bytes` directly, bypassing the quota. Used to seed state.
    pub fn insert(&self, storage_key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.lock().insert(storage_key.into(), bytes.into());
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned map is still a valid map
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DurableStore for MemoryStore {
    fn read_raw(&self, storage_key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.lock().get(storage_key).cloned())
    }

    fn write_raw(&self, storage_key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        check_quota(self.quota_bytes, bytes.len())?;
        self.lock().insert(storage_key.to_string(), bytes.to_vec());
        Ok(())
    }
}
