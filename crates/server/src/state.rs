use std::sync::Arc;

use answer::{GenerationClient, Responder};
use embed::Embedder;
use retrieve::Retriever;
use revrag::IndexOutcome;
use store::VectorStore;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Shared application state.
///
/// Built once at startup; the embedder and store are the process-scoped
/// handles every request path borrows. Cloning is cheap (everything is
/// behind an `Arc`).
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Embedding provider handle shared by the write and read paths.
    pub embedder: Arc<Embedder>,
    /// Vector store instance shared across requests.
    pub store: Arc<VectorStore>,
    /// Query-time retriever.
    pub retriever: Arc<Retriever>,
    /// Generation responder (possibly disabled).
    pub responder: Arc<Responder>,
}

impl ServerState {
    /// Construct all components from configuration.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let embedder = Arc::new(Embedder::new(config.embedder.clone())?);
        let store = Arc::new(VectorStore::open(config.store.to_store_config()?)?);
        let retriever = Arc::new(Retriever::new(embedder.clone(), store.clone()));

        let client = match &config.generation {
            Some(generation_cfg) => Some(
                GenerationClient::new(generation_cfg.clone())
                    .map_err(|e| ServerError::Config(e.to_string()))?,
            ),
            None => None,
        };
        let responder = Arc::new(Responder::new(client, config.generate_for));

        Ok(Self {
            config: Arc::new(config),
            embedder,
            store,
            retriever,
            responder,
        })
    }

    /// Index the configured corpus file, if any, before serving.
    pub async fn seed_corpus(&self) -> ServerResult<Option<IndexOutcome>> {
        let Some(path) = &self.config.corpus_path else {
            return Ok(None);
        };
        let outcome = revrag::index_corpus_file(
            path,
            &self.embedder,
            &self.store,
            &self.config.ingest,
            &self.config.cleanse,
        )
        .await?;
        tracing::info!(
            path = %path,
            indexed = outcome.indexed,
            skipped = outcome.skipped,
            "seeded corpus"
        );
        Ok(Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use answer::GeneratePolicy;

    fn memory_config() -> ServerConfig {
        ServerConfig::default()
    }

    #[test]
    fn state_builds_from_default_config() {
        let state = ServerState::new(memory_config()).expect("state builds");
        assert_eq!(state.store.count(), 0);
        assert_eq!(state.embedder.dimension(), 384);
        assert!(!state.responder.generation_enabled());
    }

    #[test]
    fn generation_disabled_without_endpoint() {
        let config = ServerConfig {
            generate_for: GeneratePolicy::All,
            generation: None,
            ..memory_config()
        };
        let state = ServerState::new(config).expect("state builds");
        assert!(!state.responder.generation_enabled());
    }

    #[tokio::test]
    async fn seed_corpus_without_path_is_none() {
        let state = ServerState::new(memory_config()).expect("state builds");
        let outcome = state.seed_corpus().await.expect("seed ok");
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn seed_corpus_indexes_jsonl_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "{}",
            r#"{"review_id":"r-1","review_text":"Works great","rating":5.0}"#
        )
        .expect("write line");
        writeln!(
            file,
            "{}",
            r#"{"review_id":"r-2","review_text":"Stopped working","rating":1.0}"#
        )
        .expect("write line");

        let config = ServerConfig {
            corpus_path: Some(file.path().display().to_string()),
            ..memory_config()
        };
        let state = ServerState::new(config).expect("state builds");
        let outcome = state
            .seed_corpus()
            .await
            .expect("seed ok")
            .expect("outcome present");
        assert_eq!(outcome.indexed, 2);
        assert_eq!(state.store.count(), 2);
    }
}
