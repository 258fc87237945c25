//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_all_handler, clear_namespace_handler, flush_handler, get_handler, get_many_handler,
    health_handler, remove_handler, remove_many_handler, set_handler, set_many_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /items` - Store one item
/// - `GET /items/:key?namespace=` - Read one item
/// - `DELETE /items/:key?namespace=` - Remove one item
/// - `DELETE /items` - Clear the whole cache
/// - `PUT /batch/set` - Store several items in order
/// - `POST /batch/get` - Read several keys
/// - `POST /batch/remove` - Remove several keys
/// - `DELETE /namespaces/:namespace` - Clear one namespace
/// - `POST /flush` - Save to the durable store now
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/items", put(set_handler).delete(clear_all_handler))
        .route("/items/:key", get(get_handler).delete(remove_handler))
        .route("/batch/set", put(set_many_handler))
        .route("/batch/get", post(get_many_handler))
        .route("/batch/remove", post(remove_many_handler))
        .route("/namespaces/:namespace", delete(clear_namespace_handler))
        .route("/flush", post(flush_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
