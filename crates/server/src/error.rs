use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use embed::EmbedError;
use ingest::IngestError;
use retrieve::RetrieveError;
use revrag::PipelineError;
use serde_json::json;
use store::StoreError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error type.
///
/// Maps the pipeline's error taxonomy onto HTTP: request validation is a
/// client fault (400), embedding-provider outage is a retryable service
/// fault (503), dimensionality drift is a deployment bug (500). Generation
/// errors never appear here - they are absorbed candidate-by-candidate
/// before a response is built.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),

    #[error("embedding provider error: {0}")]
    Embed(#[from] EmbedError),

    #[error("vector store error: {0}")]
    Store(#[from] StoreError),

    #[error("retrieval error: {0}")]
    Retrieve(#[from] RetrieveError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal server error: {0}")]
    Internal(String),

    #[error("not found")]
    NotFound,
}

fn embed_status(err: &EmbedError) -> StatusCode {
    match err {
        EmbedError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        EmbedError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EmbedError::BadResponse(_) => StatusCode::BAD_GATEWAY,
        EmbedError::WrongDimension { .. } | EmbedError::InvalidConfig(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn embed_kind(err: &EmbedError) -> &'static str {
    match err {
        EmbedError::InvalidInput(_) => "InvalidInputError",
        EmbedError::Unavailable(_) | EmbedError::BadResponse(_) => "EmbeddingUnavailableError",
        EmbedError::WrongDimension { .. } => "DimensionMismatchError",
        EmbedError::InvalidConfig(_) => "InternalError",
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    // Every store failure on a validated request is a service-side fault.
    let _ = err;
    StatusCode::INTERNAL_SERVER_ERROR
}

fn store_kind(err: &StoreError) -> &'static str {
    match err {
        StoreError::DimensionMismatch { .. } => "DimensionMismatchError",
        _ => "StoreError",
    }
}

impl ServerError {
    /// HTTP status for this error.
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) | ServerError::Ingest(_) => StatusCode::BAD_REQUEST,
            ServerError::Embed(err) => embed_status(err),
            ServerError::Store(err) => store_status(err),
            ServerError::Retrieve(err) => match err {
                RetrieveError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                RetrieveError::Embedding(inner) => embed_status(inner),
                RetrieveError::Store(inner) => store_status(inner),
            },
            ServerError::Pipeline(err) => match err {
                PipelineError::Ingest(_) | PipelineError::Cleanse(_) => StatusCode::BAD_REQUEST,
                PipelineError::Embed(inner) => embed_status(inner),
                PipelineError::Store(inner) => store_status(inner),
            },
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Config(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable error kind string for the response body.
    fn error_kind(&self) -> &'static str {
        match self {
            ServerError::Validation(_) | ServerError::Ingest(_) => "InvalidInputError",
            ServerError::Embed(err) => embed_kind(err),
            ServerError::Store(err) => store_kind(err),
            ServerError::Retrieve(err) => match err {
                RetrieveError::InvalidInput(_) => "InvalidInputError",
                RetrieveError::Embedding(inner) => embed_kind(inner),
                RetrieveError::Store(inner) => store_kind(inner),
            },
            ServerError::Pipeline(err) => match err {
                PipelineError::Ingest(_) | PipelineError::Cleanse(_) => "InvalidInputError",
                PipelineError::Embed(inner) => embed_kind(inner),
                PipelineError::Store(inner) => store_kind(inner),
            },
            ServerError::NotFound => "NotFoundError",
            ServerError::Config(_) | ServerError::Internal(_) => "InternalError",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error_kind": self.error_kind(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
