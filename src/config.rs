//! Configuration Module
//!
//! Handles loading and validating configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_CAPACITY;
use crate::error::{CacheError, Result};
use crate::sync::{Codec, DEFAULT_STORAGE_KEY};

/// Cache and server configuration.
///
/// Unset variables fall back to defaults; set but malformed variables are
/// rejected.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Name the snapshot is stored under
    pub storage_key: String,
    /// Directory for the file store; `None` keeps the cache memory-only
    pub storage_dir: Option<PathBuf>,
    /// Largest snapshot payload the store accepts, in bytes
    pub storage_quota_bytes: Option<usize>,
    /// Base64-encode the persisted payload
    pub encrypt: bool,
    /// Quiet period before a debounced save, in milliseconds
    pub sync_debounce_ms: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `STORAGE_KEY` - Snapshot name (default: `localStorage_enhance`)
    /// - `STORAGE_DIR` - File store directory (default: unset, memory-only)
    /// - `STORAGE_QUOTA_BYTES` - Payload size limit (default: unlimited)
    /// - `STORAGE_ENCRYPT` - `true` to base64 the payload (default: false)
    /// - `SYNC_DEBOUNCE_MS` - Debounce window in ms (default: 100)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            capacity: env_or("CACHE_CAPACITY", defaults.capacity)?,
            storage_key: env::var("STORAGE_KEY").unwrap_or(defaults.storage_key),
            storage_dir: env::var_os("STORAGE_DIR").map(PathBuf::from),
            storage_quota_bytes: env_opt("STORAGE_QUOTA_BYTES")?,
            encrypt: env_or("STORAGE_ENCRYPT", defaults.encrypt)?,
            sync_debounce_ms: env_or("SYNC_DEBOUNCE_MS", defaults.sync_debounce_ms)?,
            server_port: env_or("SERVER_PORT", defaults.server_port)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the cache cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "CACHE_CAPACITY must be greater than zero".to_string(),
            ));
        }
        if self.storage_key.is_empty()
            || self
                .storage_key
                .chars()
                .any(|c| matches!(c, '/' | '\\') || c.is_control())
        {
            return Err(CacheError::InvalidConfig(format!(
                "STORAGE_KEY '{}' must be non-empty and contain no path separators",
                self.storage_key
            )));
        }
        Ok(())
    }

    pub fn sync_debounce(&self) -> Duration {
        Duration::from_millis(self.sync_debounce_ms)
    }

    pub fn codec(&self) -> Codec {
        Codec::from_flag(self.encrypt)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: None,
            storage_quota_bytes: None,
            encrypt: false,
            sync_debounce_ms: 100,
            server_port: 3000,
        }
    }
}

/// Parses `name` if set, otherwise returns `default`.
fn env_or<T: FromStr>(name: &str, default: T) -> Result<T> {
    Ok(env_opt(name)?.unwrap_or(default))
}

fn env_opt<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
            CacheError::InvalidConfig(format!("{} has an invalid value: '{}'", name, raw))
        }),
        Err(_) => Ok(None),
    }
}
