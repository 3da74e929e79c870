//! Review ingestion layer.
//!
//! This crate takes raw review records from an external source (a JSON-lines
//! file or an API payload), validates them, and hands a deduplicated batch to
//! the rest of the pipeline. Nothing here touches the network or the store;
//! downstream stages can rely on every record that survives this layer having
//! a stable identity and a non-empty payload.
//!
//! ## Guarantees
//!
//! - Every returned record has a non-empty `review_id` and `review_text`.
//! - Duplicate `review_id`s within a batch collapse to the first occurrence,
//!   preserving input order.
//! - Parsing is strict: a malformed line fails the whole load with its line
//!   number rather than silently dropping data.

mod config;
mod error;
mod types;

pub use crate::config::IngestConfig;
pub use crate::error::IngestError;
pub use crate::types::RawReviewRecord;

use std::fs;
use std::path::Path;

/// Validate a single raw record against the configured limits.
///
/// Records that fail validation are rejected as a unit; there is no partial
/// acceptance of a record.
pub fn validate(record: &RawReviewRecord, cfg: &IngestConfig) -> Result<(), IngestError> {
    if record.review_id.trim().is_empty() {
        return Err(IngestError::MissingReviewId);
    }
    if record.review_text.trim().is_empty() {
        return Err(IngestError::EmptyReviewText {
            review_id: record.review_id.clone(),
        });
    }
    if record.review_text.len() > cfg.max_text_bytes {
        return Err(IngestError::TextTooLarge {
            review_id: record.review_id.clone(),
            len: record.review_text.len(),
            max: cfg.max_text_bytes,
        });
    }
    if let Some(rating) = record.rating {
        if !rating.is_finite() {
            return Err(IngestError::InvalidRating {
                review_id: record.review_id.clone(),
            });
        }
    }
    Ok(())
}

/// Parse a JSON-lines payload into raw records.
///
/// Blank lines are ignored. The first malformed line aborts the parse with
/// its 1-based line number.
pub fn parse_jsonl(input: &str) -> Result<Vec<RawReviewRecord>, IngestError> {
    let mut records = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: RawReviewRecord =
            serde_json::from_str(line).map_err(|source| IngestError::Parse {
                line: idx + 1,
                message: source.to_string(),
            })?;
        records.push(record);
    }
    Ok(records)
}

/// Drop records whose `review_id` was already seen, keeping the first
/// occurrence and the original order.
pub fn dedup_reviews(records: Vec<RawReviewRecord>) -> Vec<RawReviewRecord> {
    let mut seen = std::collections::HashSet::with_capacity(records.len());
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.review_id.clone()) {
            out.push(record);
        } else {
            tracing::debug!(review_id = %record.review_id, "dropping duplicate review");
        }
    }
    out
}

/// Load, parse, validate, and deduplicate a JSON-lines reviews file.
///
/// Records that fail validation are skipped with a warning rather than
/// aborting the load; the source files this mirrors routinely contain a few
/// null or blank rows.
pub fn load_reviews(
    path: impl AsRef<Path>,
    cfg: &IngestConfig,
) -> Result<Vec<RawReviewRecord>, IngestError> {
    let path = path.as_ref();
    let payload = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        message: source.to_string(),
    })?;

    let parsed = parse_jsonl(&payload)?;
    let total = parsed.len();

    let mut valid = Vec::with_capacity(total);
    for record in parsed {
        match validate(&record, cfg) {
            Ok(()) => valid.push(record),
            Err(err) => {
                tracing::warn!(error = %err, "skipping invalid review record");
            }
        }
    }

    let records = dedup_reviews(valid);
    tracing::info!(
        path = %path.display(),
        total,
        kept = records.len(),
        "loaded review records"
    );
    Ok(records)
}
