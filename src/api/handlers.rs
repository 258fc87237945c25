//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint, plus the shared
//! application state they operate on.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cache::ExpiringStore;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    requests::validate_namespace, ClearResponse, FlushResponse, GetResponse, HealthResponse,
    KeysRequest, ManyResponse, NamespaceQuery, RemoveResponse, SetItemRequest, SetResponse,
    StatsResponse,
};
use crate::storage::FileStore;
use crate::sync::{SaveOutcome, SyncPolicy, SyncTrigger};
use crate::tasks::{flush, spawn_sync_task, SyncHandle};

/// Application state shared across all handlers.
///
/// The store sits behind a tokio `RwLock`; every cache operation runs to
/// completion under the write lock, so operations never interleave.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache store
    pub cache: Arc<RwLock<ExpiringStore>>,
    /// Persistence policy used by the sync task and by flushes
    pub policy: Arc<SyncPolicy>,
}

impl AppState {
    /// Creates a memory-only AppState around `cache`.
    pub fn new(cache: ExpiringStore) -> Self {
        Self::with_policy(cache, SyncPolicy::memory_only())
    }

    pub fn with_policy(cache: ExpiringStore, policy: SyncPolicy) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            policy: Arc::new(policy),
        }
    }

    /// Builds the state described by `config` and starts its sync task.
    ///
    /// Loads any persisted snapshot; when there is none (or it is
    /// unreadable) an immediate save is scheduled. A storage directory that
    /// cannot be opened degrades to memory-only operation.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(config: &Config) -> Result<(Self, SyncHandle)> {
        config.validate()?;
        let policy = policy_from_config(config);

        let (trigger, requests) = SyncTrigger::channel();
        let store = match policy.load() {
            Some(snapshot) => ExpiringStore::from_snapshot(config.capacity, snapshot)?,
            None => {
                trigger.request_now();
                ExpiringStore::new(config.capacity)?
            }
        }
        .with_sync_trigger(trigger);

        let state = Self::with_policy(store, policy);
        let handle = spawn_sync_task(
            state.cache.clone(),
            state.policy.clone(),
            config.sync_debounce(),
            requests,
        );
        Ok((state, handle))
    }

    /// Saves the current cache contents now, on the blocking pool.
    pub async fn flush(&self) -> SaveOutcome {
        flush(&self.cache, &self.policy).await
    }
}

fn policy_from_config(config: &Config) -> SyncPolicy {
    let Some(dir) = &config.storage_dir else {
        info!("No STORAGE_DIR configured, running memory-only");
        return SyncPolicy::memory_only();
    };

    match FileStore::open(dir) {
        Ok(store) => {
            info!("Persisting to {}", dir.display());
            SyncPolicy::new(
                Arc::new(store.with_quota(config.storage_quota_bytes)),
                config.storage_key.clone(),
                config.codec(),
            )
        }
        Err(err) => {
            warn!(
                "Storage directory {} unavailable, running memory-only: {}",
                dir.display(),
                err
            );
            SyncPolicy::memory_only()
        }
    }
}

/// Handler for PUT /items
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetItemRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let response = SetResponse::single(&req.key);
    state.cache.write().await.set_item(req.into_item());

    Ok(Json(response))
}

/// Handler for PUT /batch/set
pub async fn set_many_handler(
    State(state): State<AppState>,
    Json(reqs): Json<Vec<SetItemRequest>>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = reqs.iter().find_map(SetItemRequest::validate) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let stored = reqs.len();
    state
        .cache
        .write()
        .await
        .set_many(reqs.into_iter().map(SetItemRequest::into_item));

    Ok(Json(SetResponse::batch(stored)))
}

/// Handler for GET /items/:key
///
/// Takes the write lock: a read refreshes recency and may delete an
/// expired entry.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<NamespaceQuery>,
) -> Result<Json<GetResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let data = state
        .cache
        .write()
        .await
        .get_item(&key, query.namespace.as_deref())
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, query.namespace, data)))
}

/// Handler for POST /batch/get
pub async fn get_many_handler(
    State(state): State<AppState>,
    Json(req): Json<KeysRequest>,
) -> Result<Json<ManyResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let items = state
        .cache
        .write()
        .await
        .get_many(&req.keys, req.namespace.as_deref());

    Ok(Json(ManyResponse::new(items)))
}

/// Handler for DELETE /items/:key
///
/// Removing an absent key succeeds with `removed: false`.
pub async fn remove_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<NamespaceQuery>,
) -> Result<Json<RemoveResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state
        .cache
        .write()
        .await
        .remove_item(&key, query.namespace.as_deref());

    Ok(Json(RemoveResponse::new(key, removed)))
}

/// Handler for POST /batch/remove
pub async fn remove_many_handler(
    State(state): State<AppState>,
    Json(req): Json<KeysRequest>,
) -> Result<Json<ManyResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let items = state
        .cache
        .write()
        .await
        .remove_many(&req.keys, req.namespace.as_deref());

    Ok(Json(ManyResponse::new(items)))
}

/// Handler for DELETE /namespaces/:namespace
pub async fn clear_namespace_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<ClearResponse>> {
    if let Some(error_msg) = validate_namespace(Some(&namespace)) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    cache.clear_namespace(&namespace);

    Ok(Json(ClearResponse::namespace(&namespace, cache.len())))
}

/// Handler for DELETE /items
pub async fn clear_all_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.write().await.clear_all();
    Json(ClearResponse::all())
}

/// Handler for POST /flush
pub async fn flush_handler(State(state): State<AppState>) -> Json<FlushResponse> {
    Json(state.flush().await.into())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::new(&cache.stats(), cache.capacity()))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.policy.is_persistent()))
}
