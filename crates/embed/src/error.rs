use thiserror::Error;

/// Errors surfaced by the embedding provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmbedError {
    /// Empty or whitespace-only input. Always the caller's fault.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The provider configuration is unusable.
    #[error("invalid embedder config: {0}")]
    InvalidConfig(String),
    /// The remote endpoint could not be reached, timed out, or answered with
    /// a failure status. Fatal to the calling path; retry policy belongs to
    /// the caller.
    #[error("embedding endpoint unavailable: {0}")]
    Unavailable(String),
    /// The endpoint answered but the payload made no sense.
    #[error("malformed embedding response: {0}")]
    BadResponse(String),
    /// The endpoint produced a vector of the wrong width. Configuration
    /// drift between provider and deployment, not a transient condition.
    #[error("embedding has {got} dimensions, provider declares {expected}")]
    WrongDimension { expected: usize, got: usize },
}
