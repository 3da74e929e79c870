//! Grounded answer generation.
//!
//! Generation is the expensive, unreliable step of the pipeline, so this
//! crate is built around one rule: a generation failure must never fail a
//! query that retrieval already answered. The [`Responder`] attaches
//! generated text to the candidates its policy selects; everything that goes
//! wrong on that path - timeout, upstream error, malformed output - is
//! recorded and degrades to `generated_response = None` for that candidate
//! alone.
//!
//! The HTTP call itself lives in [`GenerationClient`], which speaks the
//! OpenAI chat-completions dialect with an explicit per-request timeout.
//! Nothing here retries: retry policy, if any, belongs to the upstream
//! service or the operator.

mod client;
mod responder;

pub use crate::client::{GenerationClient, GenerationConfig, GenerationError};
pub use crate::responder::{GeneratePolicy, Responder};
