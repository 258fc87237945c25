//! LRU Store - A namespaced LRU cache with TTL expiration and durable sync
//!
//! Entries are evicted least-recently-used first, expire lazily after their
//! TTL, and are persisted to a durable store through a debounced sync task
//! that halves the payload when the store runs out of room.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod sync;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{Data, ExpiringStore, Item};
pub use config::Config;
pub use tasks::{flush, spawn_sync_task, SyncHandle};
