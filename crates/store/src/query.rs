use crate::{StoreError, VectorStore};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Similarity metric, declared once per store.
///
/// Cosine and inner product are monotonic transforms of each other only when
/// vectors are unit length; the store does not normalize, so whichever metric
/// is configured is applied to the vectors exactly as written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Cosine similarity. The default and documented choice.
    #[default]
    Cosine,
    /// Raw inner product.
    InnerProduct,
}

impl Metric {
    /// Score two equal-length vectors; higher is more similar.
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        match self {
            Metric::InnerProduct => dot,
            Metric::Cosine => {
                let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    return 0.0;
                }
                dot / (norm_a * norm_b)
            }
        }
    }
}

/// Result entry for a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Review identifier of the matched record.
    pub review_id: String,
    /// Stored (cleaned) review text.
    pub text: String,
    /// Similarity score under the store's metric; higher is more similar.
    pub score: f32,
    /// Stored metadata blob.
    pub metadata: serde_json::Value,
}

impl VectorStore {
    /// Search for the `top_k` records most similar to `query`.
    ///
    /// Results are ordered by descending score; ties break by ascending
    /// `review_id` so the ordering is fully deterministic for a fixed store
    /// state. Fewer than `top_k` hits come back when the store holds fewer
    /// records, and an empty store yields an empty result set.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>, StoreError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let expected = match self.dimension() {
            // No successful write yet means nothing to search.
            None => return Ok(Vec::new()),
            Some(dim) => dim,
        };
        if query.len() != expected {
            return Err(StoreError::DimensionMismatch {
                expected,
                got: query.len(),
            });
        }

        let metric = self.metric();
        let records = self.read_records()?;
        let mut results: Vec<SearchHit> = records
            .values()
            .map(|record| SearchHit {
                review_id: record.review_id.clone(),
                text: record.text.clone(),
                score: metric.score(query, &record.vector),
                metadata: record.metadata.clone(),
            })
            .collect();
        drop(records);

        results.sort_unstable_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.review_id.cmp(&b.review_id))
        });
        results.truncate(top_k);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BackendConfig, StoreConfig, StoredReview, STORE_SCHEMA_VERSION};
    use serde_json::json;

    fn record(id: &str, vector: &[f32]) -> StoredReview {
        StoredReview {
            schema_version: STORE_SCHEMA_VERSION,
            review_id: id.to_string(),
            text: format!("text for {id}"),
            vector: vector.to_vec(),
            metadata: json!({ "id": id }),
        }
    }

    fn seeded(metric: Metric, records: Vec<StoredReview>) -> crate::VectorStore {
        let store = crate::VectorStore::open(
            StoreConfig::new()
                .with_backend(BackendConfig::in_memory())
                .with_metric(metric),
        )
        .expect("store opens");
        for rec in records {
            store.upsert(rec).expect("seed record");
        }
        store
    }

    #[test]
    fn cosine_scores_direction_not_magnitude() {
        let metric = Metric::Cosine;
        let score_same = metric.score(&[2.0, 0.0], &[9.0, 0.0]);
        assert!((score_same - 1.0).abs() < 1e-6);

        let score_orthogonal = metric.score(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(score_orthogonal.abs() < 1e-6);
    }

    #[test]
    fn inner_product_scores_magnitude() {
        let metric = Metric::InnerProduct;
        assert!((metric.score(&[2.0, 0.0], &[3.0, 0.0]) - 6.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_zero_vector_scores_zero() {
        assert_eq!(Metric::Cosine.score(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn search_orders_by_score_descending() {
        let store = seeded(
            Metric::Cosine,
            vec![
                record("far", &[0.0, 1.0, 0.0, 0.0]),
                record("near", &[1.0, 0.0, 0.0, 0.0]),
                record("middle", &[1.0, 1.0, 0.0, 0.0]),
            ],
        );

        let hits = store.search(&[1.0, 0.0, 0.0, 0.0], 3).expect("search ok");
        let ids: Vec<&str> = hits.iter().map(|h| h.review_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "middle", "far"]);
        assert!(hits[0].score >= hits[1].score && hits[1].score >= hits[2].score);
    }

    #[test]
    fn ties_break_by_ascending_id() {
        let store = seeded(
            Metric::Cosine,
            vec![
                record("r-b", &[5.0, 0.0]),
                record("r-a", &[5.0, 0.0]),
                record("r-c", &[1.0, 1.0]),
            ],
        );

        let hits = store.search(&[1.0, 0.0], 3).expect("search ok");
        assert_eq!(hits[0].review_id, "r-a");
        assert_eq!(hits[1].review_id, "r-b");
        assert_eq!(hits[2].review_id, "r-c");
        assert!((hits[0].score - hits[1].score).abs() < f32::EPSILON);
    }

    #[test]
    fn repeated_searches_are_identical() {
        let store = seeded(
            Metric::Cosine,
            vec![
                record("a", &[0.9, 0.1]),
                record("b", &[0.8, 0.2]),
                record("c", &[0.1, 0.9]),
            ],
        );

        let first = store.search(&[1.0, 0.0], 3).expect("first search");
        for _ in 0..10 {
            let again = store.search(&[1.0, 0.0], 3).expect("repeat search");
            assert_eq!(first, again);
        }
    }

    #[test]
    fn top_k_truncates_and_clamps() {
        let store = seeded(
            Metric::Cosine,
            vec![
                record("a", &[1.0, 0.0]),
                record("b", &[0.9, 0.1]),
                record("c", &[0.0, 1.0]),
            ],
        );

        assert_eq!(store.search(&[1.0, 0.0], 2).expect("k=2").len(), 2);
        // Asking for more than the store holds returns exactly what it holds.
        assert_eq!(store.search(&[1.0, 0.0], 50).expect("k=50").len(), 3);
    }

    #[test]
    fn zero_top_k_short_circuits() {
        let store = seeded(Metric::Cosine, vec![record("a", &[1.0, 0.0])]);
        assert!(store.search(&[1.0, 0.0], 0).expect("k=0").is_empty());
    }

    #[test]
    fn empty_store_searches_empty() {
        let store = seeded(Metric::Cosine, vec![]);
        assert!(store.search(&[1.0, 0.0], 5).expect("empty store").is_empty());
    }

    #[test]
    fn mismatched_query_rejected() {
        let store = seeded(Metric::Cosine, vec![record("a", &[1.0, 0.0, 0.0])]);
        let err = store.search(&[1.0, 0.0], 5).expect_err("short query rejected");
        assert!(
            matches!(err, StoreError::DimensionMismatch { expected: 3, got: 2 }),
            "got {err:?}"
        );
    }

    #[test]
    fn inner_product_ranking_uses_magnitude() {
        let store = seeded(
            Metric::InnerProduct,
            vec![record("small", &[1.0, 0.0]), record("large", &[3.0, 0.0])],
        );
        let hits = store.search(&[1.0, 0.0], 2).expect("search ok");
        assert_eq!(hits[0].review_id, "large");
    }
}
