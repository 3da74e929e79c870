//! Query-time retrieval.
//!
//! The [`Retriever`] composes the embedding provider and the vector store:
//! embed the query text, search the store, and hand back ordered
//! [`SimilarityResult`]s. It trusts store ordering entirely - no re-ranking
//! happens here, only validation, clamping, and shaping.
//!
//! Failure separation matters in this crate: an unusable request is
//! [`RetrieveError::InvalidInput`] (the caller's fault), while a provider or
//! store fault propagates as its own variant so the service layer can map it
//! to the right status. Generation never enters the picture - candidates
//! leave here with `generated_response` unset, and whatever happens to them
//! afterwards cannot fail a retrieval that already succeeded.

use std::sync::Arc;

use embed::{EmbedError, Embedder};
use serde::{Deserialize, Serialize};
use store::{StoreError, VectorStore};
use thiserror::Error;

/// One ranked candidate, shaped for the query response.
///
/// Ephemeral: produced per query, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityResult {
    /// Identifier of the matched review.
    pub review_id: String,
    /// Stored review text.
    pub review_text: String,
    /// Score under the store's metric; higher is more similar. Not
    /// normalized into [0, 1] by contract.
    pub similarity_score: f32,
    /// Populated by the responder for the candidates it attempts; `None`
    /// when generation was not attempted or failed.
    pub generated_response: Option<String>,
}

/// Errors surfaced by the retrieval path.
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// Malformed request (empty query, non-positive `top_k`). Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The embedding provider failed; fatal to this query.
    #[error("query embedding failed: {0}")]
    Embedding(#[source] EmbedError),
    /// The vector store failed.
    #[error("store search failed: {0}")]
    Store(#[from] StoreError),
}

/// Embeds queries and searches the store. Cheap to clone via the inner Arcs.
pub struct Retriever {
    embedder: Arc<Embedder>,
    store: Arc<VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<Embedder>, store: Arc<VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Retrieve the `top_k` most similar reviews for `query_text`.
    ///
    /// `top_k` is clamped to `[1, store.count()]`; asking for more than the
    /// store holds returns everything it holds, and an empty store yields an
    /// empty result set. `top_k == 0` is rejected before any embedding or
    /// store access.
    pub async fn retrieve(
        &self,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<SimilarityResult>, RetrieveError> {
        if top_k == 0 {
            return Err(RetrieveError::InvalidInput(
                "top_k must be a positive integer".into(),
            ));
        }
        if query_text.trim().is_empty() {
            return Err(RetrieveError::InvalidInput(
                "query_text must not be empty".into(),
            ));
        }

        let query_vector = self
            .embedder
            .embed(query_text)
            .await
            .map_err(|err| match err {
                EmbedError::InvalidInput(msg) => RetrieveError::InvalidInput(msg),
                other => RetrieveError::Embedding(other),
            })?;

        let count = self.store.count();
        if count == 0 {
            return Ok(Vec::new());
        }
        let top_k = top_k.min(count);

        let hits = self.store.search(&query_vector, top_k)?;
        tracing::debug!(requested = top_k, returned = hits.len(), "retrieval complete");

        Ok(hits
            .into_iter()
            .map(|hit| SimilarityResult {
                review_id: hit.review_id,
                review_text: hit.text,
                similarity_score: hit.score,
                generated_response: None,
            })
            .collect())
    }
}
