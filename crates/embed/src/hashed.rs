use fxhash::hash64;

use crate::config::EmbedderConfig;
use crate::normalize::l2_normalize_in_place;

/// Deterministic local embedding: sinusoid values derived from a hash of the
/// input text. Reproducible everywhere at negligible CPU cost, which is what
/// the read/write paths and the test suite rely on.
pub(crate) fn embed_hashed(text: &str, cfg: &EmbedderConfig) -> Vec<f32> {
    let mut v = vec![0f32; cfg.dimension];
    let h = hash64(text.as_bytes());
    for (idx, value) in v.iter_mut().enumerate() {
        *value = ((h >> (idx % 32)) as f32 * 0.0001).sin();
    }
    if cfg.normalize {
        l2_normalize_in_place(&mut v);
    }
    v
}
