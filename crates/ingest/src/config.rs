use serde::{Deserialize, Serialize};

/// Limits applied to incoming review records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestConfig {
    /// Upper bound on `review_text` size in bytes. Oversized records are
    /// rejected rather than truncated.
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_text_bytes: default_max_text_bytes(),
        }
    }
}

fn default_max_text_bytes() -> usize {
    64 * 1024
}
