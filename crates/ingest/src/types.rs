use serde::{Deserialize, Serialize};

/// One raw review as it arrives from the source file or an ingest request.
///
/// The shape matches the upstream reviews dataset: only `review_id` and
/// `review_text` are mandatory; the remaining fields travel along as
/// provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawReviewRecord {
    /// Stable unique identifier assigned at the source. Immutable.
    pub review_id: String,
    /// Product the review refers to, when the source provides it.
    #[serde(default)]
    pub product_id: Option<String>,
    /// Free-text review body, as written. Cleaning happens downstream.
    pub review_text: String,
    /// Star rating from the source, if present.
    #[serde(default)]
    pub rating: Option<f32>,
    /// Source timestamp as a Unix epoch, if present.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default_to_none() {
        let record: RawReviewRecord =
            serde_json::from_str(r#"{"review_id":"r-1","review_text":"solid"}"#)
                .expect("minimal record parses");
        assert_eq!(record.review_id, "r-1");
        assert!(record.product_id.is_none());
        assert!(record.rating.is_none());
        assert!(record.timestamp.is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let record = RawReviewRecord {
            review_id: "r-2".into(),
            product_id: Some("p-9".into()),
            review_text: "arrived on time".into(),
            rating: Some(3.5),
            timestamp: Some(1_650_000_000),
        };
        let json = serde_json::to_string(&record).expect("serializes");
        let back: RawReviewRecord = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(record, back);
    }
}
