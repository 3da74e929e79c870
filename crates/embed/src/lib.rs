//! Embedding provider.
//!
//! Turns cleaned text into fixed-length `f32` vectors for similarity search.
//! The provider is a process-scoped handle: construct one [`Embedder`] from an
//! [`EmbedderConfig`], share it behind an `Arc`, and every component receives
//! it by explicit reference.
//!
//! Two modes:
//!
//! - **Hashed** - deterministic local vectors derived from a hash of the
//!   input text. No model assets, no network; identical text always yields a
//!   bit-for-bit identical vector. The default, and what tests run against.
//! - **Api** - a remote embedding endpoint over HTTP, speaking either the
//!   OpenAI embeddings payload or a bare `{"inputs": [...]}` shape.
//!
//! The declared dimensionality is part of the configuration and enforced on
//! every vector the provider hands out; a remote endpoint answering with the
//! wrong width is a hard error, not something to pad or truncate around.
//!
//! Normalization happens here when enabled (the store never normalizes), so
//! cosine-similarity consumers get unit-length vectors by default.
//!
//! Failures are never retried inside this crate. An unreachable endpoint
//! surfaces as [`EmbedError::Unavailable`] and the caller owns the retry
//! policy.

mod api;
mod config;
mod error;
mod hashed;
mod normalize;

pub use crate::config::{ApiFormat, EmbedMode, EmbedderConfig};
pub use crate::error::EmbedError;

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use lru::LruCache;

/// Process-scoped embedding handle. Thread-safe; all methods take `&self`.
pub struct Embedder {
    cfg: EmbedderConfig,
    http: Option<reqwest::Client>,
    cache: Option<Mutex<LruCache<u64, Vec<f32>>>>,
}

impl Embedder {
    /// Build the provider, constructing the HTTP client once for api mode.
    pub fn new(cfg: EmbedderConfig) -> Result<Self, EmbedError> {
        if cfg.dimension == 0 {
            return Err(EmbedError::InvalidConfig(
                "dimension must be at least 1".into(),
            ));
        }

        let http = match cfg.mode {
            EmbedMode::Hashed => None,
            EmbedMode::Api => {
                if cfg.api_url.is_none() {
                    return Err(EmbedError::InvalidConfig(
                        "api mode requires api_url".into(),
                    ));
                }
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(cfg.api_timeout_secs))
                    .build()
                    .map_err(|e| EmbedError::InvalidConfig(e.to_string()))?;
                Some(client)
            }
        };

        let cache = NonZeroUsize::new(cfg.cache_capacity).map(|cap| Mutex::new(LruCache::new(cap)));

        Ok(Self { cfg, http, cache })
    }

    /// Declared output dimensionality. Every vector this provider returns has
    /// exactly this length.
    pub fn dimension(&self) -> usize {
        self.cfg.dimension
    }

    /// Model label surfaced in stored metadata.
    pub fn model_name(&self) -> &str {
        &self.cfg.model_name
    }

    /// Embed a single text.
    ///
    /// Empty or whitespace-only input is rejected before any work happens.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.trim().is_empty() {
            return Err(EmbedError::InvalidInput(
                "text must not be empty or whitespace-only".into(),
            ));
        }

        let key = fxhash::hash64(text.as_bytes());
        if let Some(hit) = self.cache_get(key) {
            return Ok(hit);
        }

        let vector = match self.cfg.mode {
            EmbedMode::Hashed => hashed::embed_hashed(text, &self.cfg),
            EmbedMode::Api => {
                let mut vectors = api::embed_via_api(self.client()?, &self.cfg, &[text]).await?;
                vectors
                    .pop()
                    .ok_or_else(|| EmbedError::BadResponse("endpoint returned no embeddings".into()))?
            }
        };

        self.cache_put(key, &vector);
        Ok(vector)
    }

    /// Embed a batch, preserving input order and length.
    ///
    /// Observably equivalent to calling [`Embedder::embed`] once per text;
    /// the batch form exists purely for throughput against remote endpoints.
    /// Any invalid item rejects the whole batch before any embedding work.
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        for (idx, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                return Err(EmbedError::InvalidInput(format!(
                    "text at position {idx} is empty or whitespace-only"
                )));
            }
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = match self.cfg.mode {
            EmbedMode::Hashed => texts
                .iter()
                .map(|text| hashed::embed_hashed(text, &self.cfg))
                .collect(),
            EmbedMode::Api => api::embed_via_api(self.client()?, &self.cfg, texts).await?,
        };

        for (text, vector) in texts.iter().zip(vectors.iter()) {
            self.cache_put(fxhash::hash64(text.as_bytes()), vector);
        }
        Ok(vectors)
    }

    fn client(&self) -> Result<&reqwest::Client, EmbedError> {
        self.http
            .as_ref()
            .ok_or_else(|| EmbedError::InvalidConfig("api client not constructed".into()))
    }

    fn cache_get(&self, key: u64) -> Option<Vec<f32>> {
        let cache = self.cache.as_ref()?;
        let mut guard = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.get(&key).cloned()
    }

    fn cache_put(&self, key: u64, vector: &[f32]) {
        if let Some(cache) = &self.cache {
            let mut guard = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.put(key, vector.to_vec());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashed_embedder(dimension: usize) -> Embedder {
        Embedder::new(EmbedderConfig {
            dimension,
            ..EmbedderConfig::default()
        })
        .expect("hashed embedder builds")
    }

    #[tokio::test]
    async fn embed_is_deterministic() {
        let embedder = hashed_embedder(384);
        let a = embedder.embed("big cat").await.expect("first embed");
        let b = embedder.embed("big cat").await.expect("second embed");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn embed_has_declared_dimension() {
        for dimension in [8, 64, 384] {
            let embedder = hashed_embedder(dimension);
            let vector = embedder.embed("some text").await.expect("embeds");
            assert_eq!(vector.len(), dimension);
        }
    }

    #[tokio::test]
    async fn different_texts_embed_differently() {
        let embedder = hashed_embedder(64);
        let a = embedder.embed("hello").await.expect("embeds");
        let b = embedder.embed("goodbye").await.expect("embeds");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn vectors_are_unit_length_when_normalized() {
        let embedder = hashed_embedder(384);
        let vector = embedder.embed("normalize me").await.expect("embeds");
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "norm was {norm}");
    }

    #[tokio::test]
    async fn unnormalized_mode_skips_scaling() {
        let embedder = Embedder::new(EmbedderConfig {
            dimension: 16,
            normalize: false,
            ..EmbedderConfig::default()
        })
        .expect("builds");
        let vector = embedder.embed("raw values").await.expect("embeds");
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() > 1e-4, "vector should not be unit length");
    }

    #[tokio::test]
    async fn empty_text_rejected() {
        let embedder = hashed_embedder(16);
        assert!(matches!(
            embedder.embed("").await,
            Err(EmbedError::InvalidInput(_))
        ));
        assert!(matches!(
            embedder.embed("   \n\t").await,
            Err(EmbedError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn batch_preserves_order_and_matches_single_calls() {
        let embedder = hashed_embedder(32);
        let texts = ["first text", "second text", "third text"];
        let batch = embedder.embed_batch(&texts).await.expect("batch embeds");
        assert_eq!(batch.len(), texts.len());

        for (text, from_batch) in texts.iter().zip(batch.iter()) {
            let single = embedder.embed(text).await.expect("single embeds");
            assert_eq!(&single, from_batch);
        }
    }

    #[tokio::test]
    async fn batch_rejects_any_blank_item() {
        let embedder = hashed_embedder(32);
        let result = embedder.embed_batch(&["fine", "  ", "also fine"]).await;
        assert!(matches!(result, Err(EmbedError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn empty_batch_is_empty() {
        let embedder = hashed_embedder(32);
        let batch = embedder.embed_batch(&[]).await.expect("empty batch ok");
        assert!(batch.is_empty());
    }

    #[test]
    fn zero_dimension_rejected() {
        let result = Embedder::new(EmbedderConfig {
            dimension: 0,
            ..EmbedderConfig::default()
        });
        assert!(matches!(result, Err(EmbedError::InvalidConfig(_))));
    }

    #[test]
    fn api_mode_requires_url() {
        let result = Embedder::new(EmbedderConfig {
            mode: EmbedMode::Api,
            api_url: None,
            ..EmbedderConfig::default()
        });
        assert!(matches!(result, Err(EmbedError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn cache_does_not_change_results() {
        let cached = Embedder::new(EmbedderConfig {
            dimension: 48,
            cache_capacity: 16,
            ..EmbedderConfig::default()
        })
        .expect("builds");
        let uncached = Embedder::new(EmbedderConfig {
            dimension: 48,
            cache_capacity: 0,
            ..EmbedderConfig::default()
        })
        .expect("builds");

        let text = "cache transparency";
        let warm = cached.embed(text).await.expect("warms cache");
        let hit = cached.embed(text).await.expect("cache hit");
        let cold = uncached.embed(text).await.expect("no cache");

        assert_eq!(warm, hit);
        assert_eq!(warm, cold);
    }
}
