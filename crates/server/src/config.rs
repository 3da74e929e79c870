use answer::{GenerationConfig, GeneratePolicy};
use cleanse::CleanseConfig;
use embed::EmbedderConfig;
use ingest::IngestConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use store::{BackendConfig, Metric, StoreConfig};

use crate::error::{ServerError, ServerResult};

/// Server configuration.
///
/// Every field has a serde default so a bare environment boots a working
/// in-memory service; production deployments layer a `revrag` config file
/// and `REVRAG__*` environment variables on top.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB.
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Upper bound a caller may request for `top_k`.
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,

    /// `top_k` applied when the request omits it.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Temperature applied when the request omits it.
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Enable permissive CORS.
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Tracing filter directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional JSON-lines reviews file indexed before serving.
    #[serde(default)]
    pub corpus_path: Option<String>,

    /// Embedding provider settings.
    #[serde(default)]
    pub embedder: EmbedderConfig,

    /// Vector store settings.
    #[serde(default)]
    pub store: StoreSettings,

    /// Ingest validation limits.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Text cleaning settings.
    #[serde(default)]
    pub cleanse: CleanseConfig,

    /// Generation collaborator; `None` disables generation entirely.
    #[serde(default)]
    pub generation: Option<GenerationConfig>,

    /// Which candidates receive a generation call.
    #[serde(default)]
    pub generate_for: GeneratePolicy,
}

/// Store backend selection in config-file-friendly form.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreSettings {
    /// `"memory"` or `"redb"`.
    #[serde(default = "default_store_backend")]
    pub backend: String,
    /// Database file path for the redb backend.
    #[serde(default = "default_store_path")]
    pub path: String,
    /// Similarity metric, fixed for the store's lifetime.
    #[serde(default)]
    pub metric: Metric,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
            metric: Metric::default(),
        }
    }
}

impl StoreSettings {
    /// Translate into the store crate's config.
    pub fn to_store_config(&self) -> ServerResult<StoreConfig> {
        let backend = match self.backend.as_str() {
            "memory" => BackendConfig::in_memory(),
            "redb" => BackendConfig::redb(self.path.clone()),
            other => {
                return Err(ServerError::Config(format!(
                    "unknown store backend '{other}' (expected 'memory' or 'redb')"
                )))
            }
        };
        Ok(StoreConfig::new()
            .with_backend(backend)
            .with_metric(self.metric))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            max_top_k: default_max_top_k(),
            default_top_k: default_top_k(),
            default_temperature: default_temperature(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            corpus_path: None,
            embedder: EmbedderConfig::default(),
            store: StoreSettings::default(),
            ingest: IngestConfig::default(),
            cleanse: CleanseConfig::default(),
            generation: None,
            generate_for: GeneratePolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `revrag` config file, overridden
    /// by `REVRAG__*` environment variables (e.g. `REVRAG__PORT=9000`,
    /// `REVRAG__STORE__BACKEND=redb`).
    pub fn load() -> anyhow::Result<Self> {
        let builder = ::config::Config::builder()
            .add_source(::config::File::with_name("revrag").required(false))
            .add_source(::config::Environment::with_prefix("REVRAG").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;

        if config.default_top_k == 0 || config.default_top_k > config.max_top_k {
            anyhow::bail!(
                "default_top_k ({}) must be in [1, max_top_k={}]",
                config.default_top_k,
                config.max_top_k
            );
        }
        Ok(config)
    }

    /// The socket address to bind to.
    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_addr, self.port);
        addr.parse()
            .map_err(|e| ServerError::Config(format!("invalid bind address {addr}: {e}")))
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Max body size in bytes.
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_mb() -> usize {
    10
}

fn default_max_top_k() -> usize {
    100
}

fn default_top_k() -> usize {
    5
}

fn default_temperature() -> f32 {
    0.7
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_store_backend() -> String {
    "memory".to_string()
}

fn default_store_path() -> String {
    "data/revrag.redb".to_string()
}
