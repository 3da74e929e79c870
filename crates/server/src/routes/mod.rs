//! API route handlers.
//!
//! - `health`: liveness and readiness probes
//! - `query`: the semantic query endpoint
//! - `reviews`: ingest, record lookup, and store statistics

pub mod health;
pub mod query;
pub mod reviews;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Root endpoint: service name, version, and routes.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "revrag",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/query",
            "/reviews",
            "/reviews/{review_id}",
            "/stats",
            "/health",
            "/ready"
        ]
    })))
}

/// Fallback for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
