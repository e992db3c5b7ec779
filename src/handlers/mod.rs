mod audits;
pub mod rest;

pub use audits::*;

use axum::{Json, Router, middleware, routing::get};
use serde::Serialize;

use crate::db::AppState;
use crate::middleware::caller_auth;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/audits", get(list_audits))
        .route("/audits/{id}", get(get_audit))
        .route_layer(middleware::from_fn_with_state(state, caller_auth))
        .route("/health", get(health))
}
