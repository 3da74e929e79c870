use thiserror::Error;

/// Errors surfaced while loading or validating raw review records.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IngestError {
    /// The record carries no usable `review_id`.
    #[error("review record is missing a review_id")]
    MissingReviewId,
    /// The record's text is empty or whitespace-only.
    #[error("review {review_id} has empty review_text")]
    EmptyReviewText { review_id: String },
    /// The record's text exceeds the configured size limit.
    #[error("review {review_id} text is {len} bytes, max is {max}")]
    TextTooLarge {
        review_id: String,
        len: usize,
        max: usize,
    },
    /// The record's rating is NaN or infinite.
    #[error("review {review_id} has a non-finite rating")]
    InvalidRating { review_id: String },
    /// A JSON line failed to parse.
    #[error("malformed record on line {line}: {message}")]
    Parse { line: usize, message: String },
    /// The source file could not be read.
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_review_id() {
        let err = IngestError::EmptyReviewText {
            review_id: "r-42".into(),
        };
        assert!(err.to_string().contains("r-42"));
    }

    #[test]
    fn parse_error_reports_line() {
        let err = IngestError::Parse {
            line: 7,
            message: "unexpected token".into(),
        };
        assert!(err.to_string().contains("line 7"));
    }
}
