//! Background Tasks Module
//!
//! Contains the background work that runs alongside the cache.
//!
//! # Tasks
//! - Sync: debounced write-back of the cache to its durable store

mod sync;

pub use sync::{flush, spawn_sync_task, SyncHandle};
