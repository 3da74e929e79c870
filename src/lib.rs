//! Workspace umbrella crate for revrag.
//!
//! Stitches the corpus-side stages together so callers can go from a raw
//! reviews file to a searchable vector store with one call: ingest
//! validation, text cleaning, batch embedding, and the store upsert. The
//! query-side composition (retrieve + answer) lives in the server crate;
//! this crate owns the write path.

pub use cleanse::{clean, CleanedReview, CleanseConfig, CleanseError};
pub use embed::{EmbedError, Embedder, EmbedderConfig};
pub use ingest::{IngestConfig, IngestError, RawReviewRecord};
pub use store::{
    BackendConfig, Metric, SearchHit, StoreConfig, StoreError, StoredReview, VectorStore,
    STORE_SCHEMA_VERSION,
};

use serde_json::json;
use thiserror::Error;

/// Errors that can occur while indexing reviews into the store.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Loading or validating the raw records failed.
    #[error("ingest failure: {0}")]
    Ingest(#[from] IngestError),
    /// Cleaning failed for a record that passed ingest validation.
    #[error("cleanse failure: {0}")]
    Cleanse(#[from] CleanseError),
    /// The embedding provider failed; nothing from the batch is written.
    #[error("embedding failure: {0}")]
    Embed(#[from] EmbedError),
    /// The vector store rejected the write.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

/// Counters describing one indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Records embedded and upserted.
    pub indexed: usize,
    /// Records dropped before embedding (duplicates, invalid, empty after
    /// cleaning).
    pub skipped: usize,
}

/// Clean, embed, and upsert a batch of raw review records.
///
/// Tolerant of dirty data: records that fail validation or clean down to
/// nothing are skipped with a warning, since review dumps routinely carry
/// null and duplicate rows. A provider or store failure, by contrast,
/// aborts the whole batch - those are deployment faults, not data quality.
///
/// Indexing the same batch twice converges to the same store state: cleaning
/// is pure, embedding is deterministic per provider instance, and upserts
/// replace wholesale.
pub async fn index_reviews(
    embedder: &Embedder,
    vector_store: &VectorStore,
    raw_records: Vec<RawReviewRecord>,
    ingest_cfg: &IngestConfig,
    cleanse_cfg: &CleanseConfig,
) -> Result<IndexOutcome, PipelineError> {
    let total = raw_records.len();
    let mut cleaned: Vec<(RawReviewRecord, CleanedReview)> = Vec::with_capacity(total);

    for record in ingest::dedup_reviews(raw_records) {
        if let Err(err) = ingest::validate(&record, ingest_cfg) {
            tracing::warn!(error = %err, "skipping review at ingest validation");
            continue;
        }
        match clean(record.review_id.clone(), &record.review_text, cleanse_cfg) {
            Ok(cleaned_review) => cleaned.push((record, cleaned_review)),
            Err(CleanseError::EmptyInput) => {
                tracing::warn!(review_id = %record.review_id, "review empty after cleaning, skipping");
            }
            Err(err) => return Err(PipelineError::Cleanse(err)),
        }
    }

    if cleaned.is_empty() {
        return Ok(IndexOutcome {
            indexed: 0,
            skipped: total,
        });
    }

    let texts: Vec<&str> = cleaned.iter().map(|(_, c)| c.text.as_str()).collect();
    let vectors = embedder.embed_batch(&texts).await?;

    let mut batch = Vec::with_capacity(cleaned.len());
    for ((record, cleaned_review), vector) in cleaned.into_iter().zip(vectors) {
        batch.push(StoredReview {
            schema_version: STORE_SCHEMA_VERSION,
            review_id: cleaned_review.review_id,
            text: cleaned_review.text,
            vector,
            metadata: json!({
                "product_id": record.product_id,
                "rating": record.rating,
                "timestamp": record.timestamp,
                "content_sha256": cleaned_review.sha256_hex,
                "clean_version": cleaned_review.clean_version,
                "model_name": embedder.model_name(),
            }),
        });
    }

    let indexed = batch.len();
    vector_store.upsert_batch(batch)?;
    vector_store.flush()?;

    let outcome = IndexOutcome {
        indexed,
        skipped: total - indexed,
    };
    tracing::info!(indexed = outcome.indexed, skipped = outcome.skipped, "indexed review batch");
    Ok(outcome)
}

/// Load a JSON-lines reviews file and index it.
pub async fn index_corpus_file(
    path: impl AsRef<std::path::Path>,
    embedder: &Embedder,
    vector_store: &VectorStore,
    ingest_cfg: &IngestConfig,
    cleanse_cfg: &CleanseConfig,
) -> Result<IndexOutcome, PipelineError> {
    let records = ingest::load_reviews(path, ingest_cfg)?;
    index_reviews(embedder, vector_store, records, ingest_cfg, cleanse_cfg).await
}
