//! Sync Policy
//!
//! Writes cache snapshots to a durable store and reads them back. A store
//! that rejects a payload for size gets progressively smaller payloads,
//! dropping the least recently used half each time.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error, info, warn};

use crate::cache::{CacheEntry, Snapshot};
use crate::storage::DurableStore;
use crate::sync::Codec;

/// Storage key used when none is configured
pub const DEFAULT_STORAGE_KEY: &str = "localStorage_enhance";

/// Number of halvings tried after the first quota rejection
pub const MAX_SAVE_RETRIES: u32 = 2;

// == Save Outcome ==
/// Result of a save. None of these are fatal to the in-memory cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Payload written; `entries` may be fewer than the snapshot held
    Saved { entries: usize, attempts: u32 },
    /// Every attempt hit the quota; persisted state is stale
    Abandoned { attempts: u32 },
    /// Serialization or non-quota store failure
    Failed,
    /// No durable store configured
    Skipped,
}

// == Sync Policy ==
/// Reconciles snapshots with an optional durable store.
pub struct SyncPolicy {
    store: Option<Arc<dyn DurableStore>>,
    storage_key: String,
    codec: Codec,
    /// Held for the whole of a save so writes land in call order
    save_lock: Mutex<()>,
}

impl std::fmt::Debug for SyncPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncPolicy")
            .field("persistent", &self.store.is_some())
            .field("storage_key", &self.storage_key)
            .field("codec", &self.codec)
            .finish()
    }
}

impl SyncPolicy {
    // == Constructor ==
    /// Creates a policy writing to `store` under `storage_key`.
    pub fn new(store: Arc<dyn DurableStore>, storage_key: impl Into<String>, codec: Codec) -> Self {
        Self {
            store: Some(store),
            storage_key: storage_key.into(),
            codec,
            save_lock: Mutex::new(()),
        }
    }

    /// A policy without a durable store: loads nothing, saves nothing.
    pub fn memory_only() -> Self {
        Self {
            store: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            codec: Codec::Plain,
            save_lock: Mutex::new(()),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    // == Load ==
    /// Reads the persisted snapshot.
    ///
    /// Absence, store failures, and undecodable or unparseable payloads all
    /// yield `None`; the caller is expected to schedule a fresh save.
    pub fn load(&self) -> Option<Snapshot> {
        let store = self.store.as_ref()?;

        let raw = match store.read_raw(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No persisted snapshot under '{}'", self.storage_key);
                return None;
            }
            Err(err) => {
                warn!("Could not read persisted snapshot, starting empty: {}", err);
                return None;
            }
        };

        let decoded = match self.codec.decode(raw) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!("Persisted snapshot failed to decode, starting empty: {}", err);
                return None;
            }
        };

        match serde_json::from_slice::<Snapshot>(&decoded) {
            Ok(snapshot) => {
                info!(
                    "Loaded {} entries from '{}'",
                    snapshot.len(),
                    self.storage_key
                );
                Some(snapshot)
            }
            Err(err) => {
                warn!("Persisted snapshot failed to parse, starting empty: {}", err);
                None
            }
        }
    }

    // == Save ==
    /// Writes `snapshot` (most recent first) to the durable store.
    ///
    /// On a quota rejection the least recently used half of the payload is
    /// dropped and the write retried, at most `MAX_SAVE_RETRIES` times. Only
    /// the payload shrinks; the caller's cache is untouched.
    ///
    /// Concurrent saves are serialized; the last one to start wins.
    pub fn save(&self, snapshot: &[(String, CacheEntry)]) -> SaveOutcome {
        let Some(store) = self.store.as_ref() else {
            return SaveOutcome::Skipped;
        };
        let _guard = self
            .save_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut payload = snapshot;
        let mut attempt = 0;

        loop {
            let bytes = match serde_json::to_vec(payload) {
                Ok(bytes) => self.codec.encode(bytes),
                Err(err) => {
                    error!("Snapshot serialization failed: {}", err);
                    return SaveOutcome::Failed;
                }
            };

            match store.write_raw(&self.storage_key, &bytes) {
                Ok(()) => {
                    debug!(
                        "Saved {} entries ({} bytes) to '{}'",
                        payload.len(),
                        bytes.len(),
                        self.storage_key
                    );
                    return SaveOutcome::Saved {
                        entries: payload.len(),
                        attempts: attempt + 1,
                    };
                }
                Err(err) if err.is_quota_exceeded() => {
                    if attempt >= MAX_SAVE_RETRIES {
                        warn!(
                            "Giving up on saving '{}' after {} attempts, persisted data is stale: {}",
                            self.storage_key,
                            attempt + 1,
                            err
                        );
                        return SaveOutcome::Abandoned {
                            attempts: attempt + 1,
                        };
                    }

                    let keep = payload.len().div_ceil(2);
                    info!(
                        "Quota exceeded saving {} entries, retrying with the {} most recent",
                        payload.len(),
                        keep
                    );
                    payload = &payload[..keep];
                    attempt += 1;
                }
                Err(err) => {
                    error!("Saving '{}' failed: {}", self.storage_key, err);
                    return SaveOutcome::Failed;
                }
            }
        }
    }
}
