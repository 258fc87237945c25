//! Sync Module
//!
//! Write-back persistence for the cache: what gets saved and how
//! ([`SyncPolicy`], [`Codec`]) and how mutations ask for a save
//! ([`SyncTrigger`]). The task that drives saves lives in `tasks`.

mod codec;
mod policy;
mod trigger;

pub use codec::Codec;
pub use policy::{SaveOutcome, SyncPolicy, DEFAULT_STORAGE_KEY, MAX_SAVE_RETRIES};
pub use trigger::{SyncRequest, SyncTrigger};
