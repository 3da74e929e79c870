//! revrag HTTP server.
//!
//! Exposes the review retrieval pipeline as a small REST API:
//!
//! - `POST /query` - semantic search over the indexed reviews, optionally
//!   augmented with a generated answer per the configured policy
//! - `POST /reviews` - batch ingest: validate, clean, embed, upsert
//! - `GET /reviews/{review_id}` - stored record lookup
//! - `GET /stats` - store counters (record count, dimensionality, metric)
//! - `GET /`, `GET /health`, `GET /ready` - service info and probes
//!
//! Requests are handled independently on the tokio runtime; the vector store
//! is the only shared mutable state. Validation failures map to 400 with an
//! `{error_kind, message}` body, embedding-provider outages to 503, and
//! dimensionality drift to 500. Generation failures never surface as request
//! failures - affected candidates simply carry `generated_response: null`.
//!
//! Configuration loads from an optional `revrag` config file plus
//! `REVRAG__*` environment variables (see [`ServerConfig::load`]), and an
//! optional JSON-lines corpus file can be indexed before the listener comes
//! up.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
