use futures::future::join_all;
use retrieve::SimilarityResult;
use serde::{Deserialize, Serialize};

use crate::client::GenerationClient;

/// Which retrieved candidates receive a generation call.
///
/// Generation cost scales linearly with this choice; `Top1` keeps the
/// original single-answer behavior while `All` annotates every hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeneratePolicy {
    /// Generate for the best-ranked candidate only. Default.
    #[default]
    Top1,
    /// Generate for every returned candidate, concurrently.
    All,
    /// Never generate; pure retrieval.
    None,
}

/// Attaches generated answers to retrieval candidates.
///
/// Infallible by construction: per-candidate failures are logged and leave
/// that candidate's `generated_response` as `None`. Candidates are never
/// dropped, reordered, or retried here.
pub struct Responder {
    client: Option<GenerationClient>,
    policy: GeneratePolicy,
}

impl Responder {
    pub fn new(client: Option<GenerationClient>, policy: GeneratePolicy) -> Self {
        Self { client, policy }
    }

    /// A responder that never generates; retrieval results pass through.
    pub fn disabled() -> Self {
        Self {
            client: None,
            policy: GeneratePolicy::None,
        }
    }

    /// Whether this responder would attempt generation for a non-empty
    /// candidate list.
    pub fn generation_enabled(&self) -> bool {
        self.client.is_some() && self.policy != GeneratePolicy::None
    }

    /// Run the configured generation policy over `candidates`.
    ///
    /// Each attempted candidate gets its own call with its own text as
    /// context; the query and temperature are shared.
    pub async fn augment(
        &self,
        query_text: &str,
        temperature: f32,
        mut candidates: Vec<SimilarityResult>,
    ) -> Vec<SimilarityResult> {
        let client = match (&self.client, self.policy) {
            (Some(client), GeneratePolicy::Top1 | GeneratePolicy::All) => client,
            _ => return candidates,
        };
        if candidates.is_empty() {
            return candidates;
        }

        let attempt_count = match self.policy {
            GeneratePolicy::Top1 => 1,
            GeneratePolicy::All => candidates.len(),
            GeneratePolicy::None => 0,
        };

        let attempts = candidates[..attempt_count].iter().map(|candidate| {
            let review_id = candidate.review_id.clone();
            let context = candidate.review_text.clone();
            async move {
                match client.generate(&context, query_text, temperature).await {
                    Ok(answer) => Some(answer),
                    Err(err) => {
                        tracing::warn!(
                            review_id = %review_id,
                            error = %err,
                            "generation failed for candidate; returning null response"
                        );
                        None
                    }
                }
            }
        });
        let answers = join_all(attempts).await;

        for (candidate, answer) in candidates.iter_mut().zip(answers) {
            candidate.generated_response = answer;
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GenerationConfig;
    use httpmock::prelude::*;

    fn candidates(n: usize) -> Vec<SimilarityResult> {
        (0..n)
            .map(|i| SimilarityResult {
                review_id: format!("r-{i}"),
                review_text: format!("review body {i}"),
                similarity_score: 1.0 - i as f32 * 0.1,
                generated_response: None,
            })
            .collect()
    }

    fn client_for(url: String) -> GenerationClient {
        GenerationClient::new(GenerationConfig {
            api_url: url,
            api_auth_header: None,
            model: "gpt-4o-mini".into(),
            max_tokens: 64,
            timeout_secs: 5,
            system_prompt: "Use the following context to answer the question.".into(),
        })
        .expect("client builds")
    }

    #[tokio::test]
    async fn disabled_responder_passes_candidates_through() {
        let responder = Responder::disabled();
        let results = responder.augment("query", 0.7, candidates(3)).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.generated_response.is_none()));
    }

    #[tokio::test]
    async fn top1_annotates_only_the_best_candidate() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(serde_json::json!({
                    "choices": [{"message": {"content": "grounded answer"}}]
                }));
            })
            .await;

        let responder = Responder::new(
            Some(client_for(server.url("/v1/chat/completions"))),
            GeneratePolicy::Top1,
        );
        let results = responder.augment("query", 0.7, candidates(4)).await;

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].generated_response.as_deref(), Some("grounded answer"));
        assert!(results[1..].iter().all(|r| r.generated_response.is_none()));
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn all_policy_annotates_every_candidate() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(serde_json::json!({
                    "choices": [{"message": {"content": "an answer"}}]
                }));
            })
            .await;

        let responder = Responder::new(
            Some(client_for(server.url("/v1/chat/completions"))),
            GeneratePolicy::All,
        );
        let results = responder.augment("query", 0.7, candidates(3)).await;

        assert!(results
            .iter()
            .all(|r| r.generated_response.as_deref() == Some("an answer")));
        assert_eq!(mock.hits_async().await, 3);
    }

    #[tokio::test]
    async fn failures_null_out_without_dropping_candidates() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(500).body("upstream exploded");
            })
            .await;

        let responder = Responder::new(
            Some(client_for(server.url("/v1/chat/completions"))),
            GeneratePolicy::All,
        );
        let before = candidates(5);
        let results = responder.augment("query", 0.7, before.clone()).await;

        // Every candidate survives with its retrieval fields intact.
        assert_eq!(results.len(), before.len());
        for (result, original) in results.iter().zip(before.iter()) {
            assert_eq!(result.review_id, original.review_id);
            assert_eq!(result.review_text, original.review_text);
            assert_eq!(result.similarity_score, original.similarity_score);
            assert!(result.generated_response.is_none());
        }
    }

    #[tokio::test]
    async fn empty_candidate_list_is_a_no_op() {
        let responder = Responder::new(None, GeneratePolicy::Top1);
        let results = responder.augment("query", 0.7, Vec::new()).await;
        assert!(results.is_empty());
    }

    #[test]
    fn policy_deserializes_lowercase() {
        let top1: GeneratePolicy = serde_json::from_str("\"top1\"").expect("parses");
        let all: GeneratePolicy = serde_json::from_str("\"all\"").expect("parses");
        let none: GeneratePolicy = serde_json::from_str("\"none\"").expect("parses");
        assert_eq!(top1, GeneratePolicy::Top1);
        assert_eq!(all, GeneratePolicy::All);
        assert_eq!(none, GeneratePolicy::None);
    }
}
