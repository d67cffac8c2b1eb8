//! stats-admin library - administration service for harvesting sources
//!
//! Serves the admin UI and the REST API over the `country` and `source`
//! tables, guarded by server-side sessions.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod check;
pub mod db;
pub mod error;
pub mod forms;
pub mod mapping;
pub mod pagination;
pub mod session;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
///
/// `/api/v1/*` and `/api/me` require a logged-in active user. Health, build
/// info, login/logout and the UI shell are public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::get;

    // route_layer keeps unmatched paths out of the guard so they reach the fallback
    let protected = Router::new()
        .merge(api::country_routes())
        .merge(api::source_routes())
        .route("/api/me", get(api::current_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), api::require_user));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::auth_routes())
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .fallback(api::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
