use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::config::CleanseConfig;
use crate::error::CleanseError;
use crate::hash::hash_cleaned_bytes;

/// A review whose text has been normalized for embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanedReview {
    /// Identity carried over from the raw record.
    pub review_id: String,
    /// Cleaned, non-empty text. This is what gets embedded and stored.
    pub text: String,
    /// Versioned SHA-256 of the cleaned text, for change detection.
    pub sha256_hex: String,
    /// Cleaning config version that produced this output.
    pub clean_version: u32,
}

/// Main entry point. Takes raw review text and a config and returns the
/// cleaned review, or an error when nothing survives cleaning.
pub fn clean(
    review_id: impl Into<String>,
    input: &str,
    cfg: &CleanseConfig,
) -> Result<CleanedReview, CleanseError> {
    // Version 0 is reserved so hashes can never collide with "unversioned".
    if cfg.version == 0 {
        return Err(CleanseError::InvalidConfig(
            "config version must be >= 1".into(),
        ));
    }

    let review_id: String = review_id.into();
    let trimmed = review_id.trim();
    if trimmed.is_empty() {
        return Err(CleanseError::MissingReviewId);
    }
    let review_id = if review_id.len() == trimmed.len() {
        review_id
    } else {
        trimmed.to_string()
    };

    // Unicode normalization first; it can change character boundaries.
    let normalized: Cow<str> = if cfg.normalize_unicode {
        Cow::Owned(input.nfkc().collect::<String>())
    } else {
        Cow::Borrowed(input)
    };

    let mut text = String::with_capacity(normalized.len());
    let mut pending_space = false;

    for ch in normalized.chars() {
        // The source transform treats everything outside \w and \s as a
        // delimiter, so word characters are alphanumerics plus underscore.
        let is_word = ch.is_alphanumeric() || ch == '_';
        let is_delim = ch.is_whitespace() || (cfg.strip_non_word && !is_word);
        if is_delim {
            if !text.is_empty() {
                pending_space = true;
            }
            continue;
        }
        if pending_space {
            text.push(' ');
            pending_space = false;
        }
        if cfg.lowercase {
            // Lowercasing can expand one char into several (e.g. ß -> ss).
            for lower in ch.to_lowercase() {
                text.push(lower);
            }
        } else {
            text.push(ch);
        }
    }

    if text.is_empty() {
        return Err(CleanseError::EmptyInput);
    }

    let sha256_hex = hash_cleaned_bytes(cfg.version, text.as_bytes());

    Ok(CleanedReview {
        review_id,
        text,
        sha256_hex,
        clean_version: cfg.version,
    })
}

/// Collapse runs of whitespace to single spaces and trim the ends.
/// Exposed for callers that need the whitespace pass alone.
pub fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() {
                pending_space = true;
            }
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_whitespace_handles_mixed_runs() {
        assert_eq!(collapse_whitespace("  a\t\tb \n c  "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn clean_without_lowercasing() {
        let cfg = CleanseConfig {
            lowercase: false,
            ..Default::default()
        };
        let out = clean("r", "Keep CASE here", &cfg).expect("cleans");
        assert_eq!(out.text, "Keep CASE here");
    }

    #[test]
    fn clean_without_stripping_keeps_punctuation() {
        let cfg = CleanseConfig {
            strip_non_word: false,
            ..Default::default()
        };
        let out = clean("r", "Nice, very nice!", &cfg).expect("cleans");
        assert_eq!(out.text, "nice, very nice!");
    }

    #[test]
    fn dotted_capital_i_expands_on_lowercase() {
        let cfg = CleanseConfig {
            normalize_unicode: false,
            strip_non_word: false,
            ..Default::default()
        };
        let out = clean("r", "\u{130}ZM\u{130}R", &cfg).expect("cleans");
        assert_eq!(out.text, "i\u{307}zmi\u{307}r");
    }
}
