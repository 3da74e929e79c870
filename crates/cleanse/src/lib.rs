//! Review text cleaning layer.
//!
//! Normalizes raw review text into the deterministic form the embedding and
//! storage stages operate on: Unicode NFKC, lowercasing, non-word character
//! stripping, and whitespace collapsing, finished with a versioned content
//! hash so re-embedding the same text is observable as a no-op.
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no locale dependence. Same text + same config =
//! same `CleanedReview` on any machine, forever. That property is what makes
//! upserts idempotent further down the pipeline.
//!
//! ## Invariants
//!
//! - Input is trusted UTF-8 from the ingest stage; ingest constraints are not
//!   re-validated here.
//! - Output depends only on text + config.
//! - Hash = SHA-256(version || 0x00 || cleaned_text).

mod clean;
mod config;
mod error;
mod hash;

pub use crate::clean::{clean, collapse_whitespace, CleanedReview};
pub use crate::config::CleanseConfig;
pub use crate::error::CleanseError;
pub use crate::hash::{hash_cleaned_bytes, hash_text};
