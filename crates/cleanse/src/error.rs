use thiserror::Error;

/// Errors from the cleaning stage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CleanseError {
    /// Nothing survived cleaning (input was empty or all delimiters).
    #[error("input text is empty after cleaning")]
    EmptyInput,
    /// Cleaning requires a review identity for traceability.
    #[error("review_id must not be empty")]
    MissingReviewId,
    /// The config itself is unusable.
    #[error("invalid cleanse config: {0}")]
    InvalidConfig(String),
}
