use serde::{Deserialize, Serialize};

/// Which embedding implementation to run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMode {
    /// Deterministic local vectors derived from a text hash. No assets, no
    /// network. Default.
    #[default]
    Hashed,
    /// Remote HTTP embedding endpoint.
    Api,
}

/// Payload dialect for api mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiFormat {
    /// `{"model": ..., "input": [...]}` request, `{"data": [{"embedding": [...]}]}` response.
    #[default]
    OpenAi,
    /// `{"inputs": [...]}` request, `[[...], ...]` response.
    Raw,
}

/// Runtime configuration for the embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedderConfig {
    /// Implementation selector.
    #[serde(default)]
    pub mode: EmbedMode,
    /// Friendly model label recorded alongside stored vectors.
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Fixed output dimensionality. Every vector this provider produces has
    /// exactly this length; a remote endpoint disagreeing is an error.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Embedding endpoint for api mode.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Authorization header value (e.g. `"Bearer sk-..."`) for api mode.
    #[serde(default)]
    pub api_auth_header: Option<String>,
    /// Payload dialect for api mode.
    #[serde(default)]
    pub api_format: ApiFormat,
    /// Overall HTTP timeout in seconds for api mode.
    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: u64,
    /// L2-normalize vectors to unit length (recommended for cosine).
    #[serde(default = "default_true")]
    pub normalize: bool,
    /// Capacity of the per-provider embedding memo cache; 0 disables it.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            mode: EmbedMode::default(),
            model_name: default_model_name(),
            dimension: default_dimension(),
            api_url: None,
            api_auth_header: None,
            api_format: ApiFormat::default(),
            api_timeout_secs: default_api_timeout_secs(),
            normalize: true,
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_dimension() -> usize {
    384
}

fn default_api_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    2048
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_model() {
        let cfg = EmbedderConfig::default();
        assert_eq!(cfg.mode, EmbedMode::Hashed);
        assert_eq!(cfg.model_name, "all-MiniLM-L6-v2");
        assert_eq!(cfg.dimension, 384);
        assert!(cfg.normalize);
        assert_eq!(cfg.api_timeout_secs, 30);
    }

    #[test]
    fn mode_deserializes_lowercase() {
        let cfg: EmbedderConfig =
            serde_json::from_str(r#"{"mode": "api", "api_url": "http://localhost:9"}"#)
                .expect("parses");
        assert_eq!(cfg.mode, EmbedMode::Api);
        assert_eq!(cfg.api_url.as_deref(), Some("http://localhost:9"));
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = EmbedderConfig {
            mode: EmbedMode::Api,
            api_url: Some("https://api.example.com/v1/embeddings".into()),
            api_auth_header: Some("Bearer token".into()),
            api_format: ApiFormat::Raw,
            dimension: 768,
            ..EmbedderConfig::default()
        };
        let json = serde_json::to_string(&cfg).expect("serializes");
        let back: EmbedderConfig = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(cfg, back);
    }
}
