//! # Health Handlers
//!
//! Unauthenticated liveness endpoints.

use axum::{extract::State, Json};
use lib_core::Config;
use serde_json::{json, Value};

/// `GET /` - service banner.
pub async fn root(State(config): State<Config>) -> Json<Value> {
    Json(json!({
        "message": config.app_name,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": config.environment,
    }))
}

/// `GET /health`
pub async fn health(State(config): State<Config>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "environment": config.environment,
    }))
}
