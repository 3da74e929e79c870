//! Review vector store.
//!
//! Persists `(review_id, text, vector, metadata)` tuples and serves
//! nearest-neighbor searches over them with deterministic ranking.
//!
//! ## Shape
//!
//! - A [`StoreBackend`] is a plain key-value durability layer. The in-memory
//!   backend is always available; the `backend-redb` feature (default) adds a
//!   pure-Rust embedded database for on-disk deployments.
//! - Records are bincode-encoded and zstd-compressed before hitting the
//!   backend.
//! - An in-memory read view (`RwLock<HashMap>`) is hydrated from the backend
//!   at open and kept write-through, so searches and lookups always observe a
//!   consistent snapshot and never a half-updated record.
//!
//! ## Dimensionality
//!
//! The store fixes its vector dimensionality on the first successful write
//! and holds it for its lifetime. Any later upsert or search with a vector of
//! a different length is rejected with [`StoreError::DimensionMismatch`] -
//! never padded, never truncated. That mismatch indicates deployment drift
//! between embedding provider and store, not a transient fault.
//!
//! ## Ranking
//!
//! `search` orders by descending score under the configured [`Metric`], with
//! ties broken by ascending `review_id`, so repeated searches over the same
//! state return identical orderings. The store does not normalize vectors;
//! normalization is the embedding provider's responsibility.

mod backend;
mod query;

#[cfg(feature = "backend-redb")]
pub use backend::RedbBackend;
pub use backend::{BackendConfig, InMemoryBackend, StoreBackend};
pub use query::{Metric, SearchHit};

use std::sync::{OnceLock, RwLock};

use bincode::config::standard;
use bincode::error::{DecodeError, EncodeError};
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zstd::{decode_all, encode_all};

/// Bump this value whenever the on-disk `StoredReview` layout changes.
pub const STORE_SCHEMA_VERSION: u16 = 1;

mod metadata_serde {
    use serde::de::Error as DeError;
    use serde::ser::Error as SerError;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    // bincode cannot drive `Value`'s self-describing deserializer, so the
    // metadata travels as a JSON byte blob inside the record.
    pub(super) fn serialize<S>(value: &Value, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes = serde_json::to_vec(value).map_err(SerError::custom)?;
        serializer.serialize_bytes(&bytes)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        serde_json::from_slice(&bytes).map_err(DeError::custom)
    }
}

/// One persisted review with its embedding.
///
/// The `review_id`/`text` pairing is immutable once written; re-embedding
/// replaces the whole record, never part of it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoredReview {
    /// Schema version for backward compatibility when deserializing.
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    /// Stable review identifier, the store key.
    pub review_id: String,
    /// Cleaned review text this vector was computed from.
    pub text: String,
    /// Embedding; length equals the store's fixed dimensionality.
    pub vector: Vec<f32>,
    /// Arbitrary provenance metadata (product id, rating, model name, ...).
    #[serde(with = "metadata_serde")]
    pub metadata: serde_json::Value,
}

const fn default_schema_version() -> u16 {
    STORE_SCHEMA_VERSION
}

/// Compression codec options for record storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CompressionCodec {
    /// No compression (useful when debugging raw backend contents).
    None,
    /// Zstd compression (default).
    #[default]
    Zstd,
}

/// Compression behavior configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Zstd level; ignored for `CompressionCodec::None`.
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, StoreError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => {
                encode_all(data, self.level).map_err(|e| StoreError::Compression(e.to_string()))
            }
        }
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, StoreError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => {
                decode_all(data).map_err(|e| StoreError::Compression(e.to_string()))
            }
        }
    }
}

/// Config for opening a store.
#[derive(Clone, Debug, Default)]
pub struct StoreConfig {
    /// Durability backend (in-memory or redb).
    pub backend: BackendConfig,
    /// Record compression settings.
    pub compression: CompressionConfig,
    /// Similarity metric, declared once for the store's lifetime.
    pub metric: Metric,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }
}

/// Errors surfaced by the vector store.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// A vector's length disagrees with the store's fixed dimensionality.
    #[error("vector has {got} dimensions, store is fixed at {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    /// The record itself is unusable (empty id, empty vector).
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    /// The durability backend failed.
    #[error("backend error: {0}")]
    Backend(String),
    /// Record encoding failed.
    #[error("encode error: {0}")]
    Encode(String),
    /// Record decoding failed (corrupt or incompatible data).
    #[error("decode error: {0}")]
    Decode(String),
    /// Compression or decompression failed.
    #[error("compression error: {0}")]
    Compression(String),
}

impl From<EncodeError> for StoreError {
    fn from(e: EncodeError) -> Self {
        StoreError::Encode(e.to_string())
    }
}

impl From<DecodeError> for StoreError {
    fn from(e: DecodeError) -> Self {
        StoreError::Decode(e.to_string())
    }
}

impl StoreError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

/// The vector store: a durability backend plus an in-memory read view.
pub struct VectorStore {
    backend: Box<dyn StoreBackend>,
    cfg: StoreConfig,
    /// Fixed by the first successful write, immutable afterwards.
    dimension: OnceLock<usize>,
    pub(crate) records: RwLock<hashbrown::HashMap<String, StoredReview>>,
}

impl VectorStore {
    /// Open a store using the configured backend, hydrating the read view
    /// from whatever the backend already holds.
    pub fn open(cfg: StoreConfig) -> Result<Self, StoreError> {
        let backend = cfg.backend.build()?;
        Self::with_backend(cfg, backend)
    }

    /// Open a store over a caller-supplied backend (dependency injection for
    /// tests and embedders of this crate).
    pub fn with_backend(cfg: StoreConfig, backend: Box<dyn StoreBackend>) -> Result<Self, StoreError> {
        let store = Self {
            backend,
            cfg,
            dimension: OnceLock::new(),
            records: RwLock::new(hashbrown::HashMap::new()),
        };
        store.hydrate()?;
        Ok(store)
    }

    fn hydrate(&self) -> Result<(), StoreError> {
        let mut loaded = hashbrown::HashMap::new();
        self.backend.scan(&mut |data: &[u8]| {
            let record = self.decode_record(data)?;
            loaded.insert(record.review_id.clone(), record);
            Ok(())
        })?;

        for record in loaded.values() {
            let expected = *self.dimension.get_or_init(|| record.vector.len());
            if record.vector.len() != expected {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    got: record.vector.len(),
                });
            }
        }

        if !loaded.is_empty() {
            tracing::info!(records = loaded.len(), "hydrated vector store");
        }
        let mut records = self.write_records()?;
        *records = loaded;
        Ok(())
    }

    /// Insert or replace a record atomically.
    ///
    /// The write lock linearizes upserts: a reader observes either the old
    /// record or the new one, never a mixture, and concurrent upserts of the
    /// same id commit in a deterministic lock-acquisition order.
    pub fn upsert(&self, record: StoredReview) -> Result<(), StoreError> {
        Self::check_record(&record)?;
        let payload = self.encode_record(&record)?;

        let mut records = self.write_records()?;
        let expected = *self.dimension.get_or_init(|| record.vector.len());
        if record.vector.len() != expected {
            return Err(StoreError::DimensionMismatch {
                expected,
                got: record.vector.len(),
            });
        }
        self.backend.put(&record.review_id, &payload)?;
        records.insert(record.review_id.clone(), record);
        Ok(())
    }

    /// Insert or replace a batch of records in one backend transaction.
    ///
    /// Validation runs over the whole batch before anything commits, so a
    /// bad record rejects the batch without partial writes.
    pub fn upsert_batch(&self, batch: Vec<StoredReview>) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        for record in &batch {
            Self::check_record(record)?;
        }

        let mut entries = Vec::with_capacity(batch.len());
        for record in &batch {
            entries.push((record.review_id.clone(), self.encode_record(record)?));
        }

        let mut records = self.write_records()?;
        let expected = *self.dimension.get_or_init(|| batch[0].vector.len());
        for record in &batch {
            if record.vector.len() != expected {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    got: record.vector.len(),
                });
            }
        }
        self.backend.batch_put(entries)?;
        for record in batch {
            records.insert(record.review_id.clone(), record);
        }
        Ok(())
    }

    /// Retrieve a record by id. `Ok(None)` when the id is unknown.
    pub fn get(&self, review_id: &str) -> Result<Option<StoredReview>, StoreError> {
        let records = self.read_records()?;
        Ok(records.get(review_id).cloned())
    }

    /// Number of embedded records currently held.
    pub fn count(&self) -> usize {
        self.read_records().map(|r| r.len()).unwrap_or(0)
    }

    /// The fixed dimensionality, once the first write has established it.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension.get().copied()
    }

    /// The similarity metric this store was opened with.
    pub fn metric(&self) -> Metric {
        self.cfg.metric
    }

    /// Flush backend buffers where the backend supports it.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.backend.flush()
    }

    fn check_record(record: &StoredReview) -> Result<(), StoreError> {
        if record.review_id.trim().is_empty() {
            return Err(StoreError::InvalidRecord("review_id must not be empty".into()));
        }
        if record.vector.is_empty() {
            return Err(StoreError::InvalidRecord("vector must not be empty".into()));
        }
        Ok(())
    }

    pub(crate) fn read_records(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, hashbrown::HashMap<String, StoredReview>>, StoreError>
    {
        self.records
            .read()
            .map_err(|_| StoreError::Backend("poisoned lock".into()))
    }

    fn write_records(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, hashbrown::HashMap<String, StoredReview>>, StoreError>
    {
        self.records
            .write()
            .map_err(|_| StoreError::Backend("poisoned lock".into()))
    }

    fn decode_record(&self, data: &[u8]) -> Result<StoredReview, StoreError> {
        let decompressed = self.cfg.compression.decompress(data)?;
        let (record, _) = decode_from_slice(&decompressed, standard())?;
        Ok(record)
    }

    fn encode_record(&self, record: &StoredReview) -> Result<Vec<u8>, StoreError> {
        let encoded = encode_to_vec(record, standard())?;
        self.cfg.compression.compress(&encoded)
    }
}
