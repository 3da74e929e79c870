use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use ingest::RawReviewRecord;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;

/// Batch ingest request.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub reviews: Vec<RawReviewRecord>,
}

/// Batch ingest outcome.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Records embedded and stored from this batch.
    pub indexed: usize,
    /// Records dropped (duplicate, invalid, empty after cleaning).
    pub skipped: usize,
    /// Store size after the batch.
    pub count: usize,
}

/// `POST /reviews` - validate, clean, embed, and upsert a batch of reviews.
pub async fn ingest_reviews(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<IngestRequest>,
) -> ServerResult<Json<IngestResponse>> {
    if request.reviews.is_empty() {
        return Err(ServerError::Validation(
            "'reviews' must contain at least one record".into(),
        ));
    }

    let outcome = revrag::index_reviews(
        &state.embedder,
        &state.store,
        request.reviews,
        &state.config.ingest,
        &state.config.cleanse,
    )
    .await?;

    Ok(Json(IngestResponse {
        indexed: outcome.indexed,
        skipped: outcome.skipped,
        count: state.store.count(),
    }))
}

/// `GET /reviews/{review_id}` - fetch one stored record (without its vector).
pub async fn get_review(
    State(state): State<Arc<ServerState>>,
    Path(review_id): Path<String>,
) -> ServerResult<Json<serde_json::Value>> {
    match state.store.get(&review_id)? {
        Some(record) => Ok(Json(json!({
            "review_id": record.review_id,
            "review_text": record.text,
            "metadata": record.metadata,
        }))),
        None => Err(ServerError::NotFound),
    }
}

/// `GET /stats` - store counters.
pub async fn stats(State(state): State<Arc<ServerState>>) -> ServerResult<Json<serde_json::Value>> {
    Ok(Json(json!({
        "count": state.store.count(),
        "dimension": state.store.dimension(),
        "metric": state.store.metric(),
        "generation_enabled": state.responder.generation_enabled(),
    })))
}
