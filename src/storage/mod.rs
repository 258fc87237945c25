//! Storage Module
//!
//! Durable key/value backends the cache snapshot is written to.
//!
//! # Backends
//! - [`FileStore`]: one file per storage key inside a directory
//! - [`MemoryStore`]: in-process map, handy for tests and embedding

mod file;
mod memory;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

// == Store Error ==
/// Failure reported by a durable store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The payload does not fit in the store's quota
    #[error("storage quota exceeded: {needed} bytes requested, {limit} bytes allowed")]
    QuotaExceeded { needed: usize, limit: usize },

    /// The backing medium could not be read or written
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StoreError::QuotaExceeded { .. })
    }
}

// == Durable Store ==
/// A bounded, byte-oriented key/value store.
///
/// Implementations are blocking; callers on an async runtime should move
/// calls onto a blocking thread.
pub trait DurableStore: Send + Sync {
    /// Reads the payload stored under `storage_key`, `None` if absent.
    fn read_raw(&self, storage_key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces the payload stored under `storage_key`.
    ///
    /// Returns `StoreError::QuotaExceeded` when the payload is too large.
    fn write_raw(&self, storage_key: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Checks `needed` against an optional byte quota.
fn check_quota(quota: Option<usize>, needed: usize) -> Result<(), StoreError> {
    match quota {
        Some(limit) if needed > limit => Err(StoreError::QuotaExceeded { needed, limit }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_quota() {
        assert!(check_quota(None, usize::MAX).is_ok());
        assert!(check_quota(Some(10), 10).is_ok());

        let err = check_quota(Some(10), 11).unwrap_err();
        assert!(err.is_quota_exceeded());
        assert!(err.to_string().contains("11 bytes requested"));
    }

    #[test]
    fn test_io_error_is_not_quota() {
        let err: StoreError = std::io::Error::other("disk gone").into();
        assert!(!err.is_quota_exceeded());
    }
}
