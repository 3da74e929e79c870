use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use retrieve::SimilarityResult;
use serde::Deserialize;

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;

/// Query request body.
///
/// `top_k` deserializes as a signed integer so that negative values reach
/// validation instead of failing JSON decoding with an opaque 422.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// Free-text query.
    pub query_text: String,
    /// Number of similar reviews to return; defaults from config.
    #[serde(default)]
    pub top_k: Option<i64>,
    /// Sampling temperature for generation; defaults from config.
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// `POST /query` - retrieve the most similar reviews, optionally augmented
/// with generated answers.
///
/// Validation happens before any embedding or store access; an invalid
/// `top_k` never touches the index. Retrieval faults abort the request with
/// the mapped status, while generation faults only null out the affected
/// candidates' `generated_response`.
pub async fn query_reviews(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<QueryRequest>,
) -> ServerResult<Json<Vec<SimilarityResult>>> {
    if request.query_text.trim().is_empty() {
        return Err(ServerError::Validation(
            "'query_text' must not be empty".into(),
        ));
    }

    let max_top_k = state.config.max_top_k;
    let top_k = match request.top_k {
        None => state.config.default_top_k,
        Some(k) if k < 1 => {
            return Err(ServerError::Validation(
                "'top_k' must be a positive integer".into(),
            ))
        }
        Some(k) if k as usize > max_top_k => {
            return Err(ServerError::Validation(format!(
                "'top_k' must not exceed {max_top_k}"
            )))
        }
        Some(k) => k as usize,
    };

    let temperature = match request.temperature {
        None => state.config.default_temperature,
        Some(t) if !(0.0..=2.0).contains(&t) => {
            return Err(ServerError::Validation(
                "'temperature' must be within [0.0, 2.0]".into(),
            ))
        }
        Some(t) => t,
    };

    let candidates = state.retriever.retrieve(&request.query_text, top_k).await?;
    let results = state
        .responder
        .augment(&request.query_text, temperature, candidates)
        .await;

    tracing::debug!(
        results = results.len(),
        generated = results.iter().filter(|r| r.generated_response.is_some()).count(),
        "query handled"
    );
    Ok(Json(results))
}
