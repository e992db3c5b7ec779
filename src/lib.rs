//! Read-only REST API over the audit log.

pub mod config;
pub mod criteria;
pub mod db;
pub mod error;
pub mod extractors;
pub mod filters;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod services;
pub mod util;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::db::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    handlers::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
