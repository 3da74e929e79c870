use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Configuration for the generation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// Chat-completions endpoint URL.
    pub api_url: String,
    /// Authorization header value (e.g. `"Bearer sk-..."`).
    #[serde(default)]
    pub api_auth_header: Option<String>,
    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Token budget for the generated answer.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Hard deadline per generation call, in seconds. On expiry the call is
    /// treated as a generation failure, never a retrieval failure.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// System prompt framing the context.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    150
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_system_prompt() -> String {
    "Use the following context to answer the question.".to_string()
}

/// Errors from a single generation call. Absorbed per-candidate by the
/// responder; never escalated to a request failure.
#[derive(Debug, Error, Clone)]
pub enum GenerationError {
    /// The client could not be constructed.
    #[error("invalid generation config: {0}")]
    InvalidConfig(String),
    /// Transport-level failure reaching the endpoint.
    #[error("generation request failed: {0}")]
    Http(String),
    /// The endpoint answered with a failure status.
    #[error("generation endpoint answered {status}: {body}")]
    Upstream { status: u16, body: String },
    /// The endpoint answered 200 but the payload was unusable.
    #[error("malformed generation response: {0}")]
    BadResponse(String),
    /// The call exceeded its deadline.
    #[error("generation timed out after {0}s")]
    Timeout(u64),
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

/// Thin chat-completions client with an explicit per-call deadline.
pub struct GenerationClient {
    http: reqwest::Client,
    cfg: GenerationConfig,
}

impl GenerationClient {
    pub fn new(cfg: GenerationConfig) -> Result<Self, GenerationError> {
        if cfg.api_url.trim().is_empty() {
            return Err(GenerationError::InvalidConfig(
                "api_url must not be empty".into(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| GenerationError::InvalidConfig(e.to_string()))?;
        Ok(Self { http, cfg })
    }

    /// Generate an answer for `query` grounded in `context`.
    ///
    /// One request, one deadline, no retries.
    pub async fn generate(
        &self,
        context: &str,
        query: &str,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let payload = json!({
            "model": self.cfg.model,
            "messages": [
                { "role": "system", "content": self.cfg.system_prompt },
                { "role": "user", "content": format!("Context: {context}\n\nQuestion: {query}") }
            ],
            "temperature": temperature,
            "max_tokens": self.cfg.max_tokens,
        });

        let mut request = self.http.post(&self.cfg.api_url).json(&payload);
        if let Some(auth) = &self.cfg.api_auth_header {
            request = request.header(AUTHORIZATION, auth);
        }

        let deadline = Duration::from_secs(self.cfg.timeout_secs);
        let response = tokio::time::timeout(deadline, request.send())
            .await
            .map_err(|_| GenerationError::Timeout(self.cfg.timeout_secs))?
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(self.cfg.timeout_secs)
                } else {
                    GenerationError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::BadResponse(e.to_string()))?;
        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::BadResponse("no choices in response".into()))?;

        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn config(url: String) -> GenerationConfig {
        GenerationConfig {
            api_url: url,
            api_auth_header: Some("Bearer test-key".into()),
            model: default_model(),
            max_tokens: 150,
            timeout_secs: 5,
            system_prompt: default_system_prompt(),
        }
    }

    #[test]
    fn empty_url_rejected() {
        let result = GenerationClient::new(config(String::new()));
        assert!(matches!(result, Err(GenerationError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn generate_extracts_first_choice() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .json_body_includes(r#"{"model": "gpt-4o-mini"}"#);
                then.status(200).json_body(serde_json::json!({
                    "choices": [
                        {"message": {"role": "assistant", "content": "  The reviews praise the battery.  "}}
                    ]
                }));
            })
            .await;

        let client =
            GenerationClient::new(config(server.url("/v1/chat/completions"))).expect("builds");
        let answer = client
            .generate("battery lasts two days", "how is the battery?", 0.7)
            .await
            .expect("generation succeeds");

        assert_eq!(answer, "The reviews praise the battery.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upstream_failure_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(429).body("rate limited");
            })
            .await;

        let client =
            GenerationClient::new(config(server.url("/v1/chat/completions"))).expect("builds");
        let err = client
            .generate("ctx", "q", 0.5)
            .await
            .expect_err("must fail");
        assert!(
            matches!(err, GenerationError::Upstream { status: 429, .. }),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_http_error() {
        let client = GenerationClient::new(config("http://127.0.0.1:9/v1/chat".into()))
            .expect("builds");
        let err = client
            .generate("ctx", "q", 0.5)
            .await
            .expect_err("must fail");
        assert!(matches!(err, GenerationError::Http(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn empty_choices_is_bad_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200)
                    .json_body(serde_json::json!({ "choices": [] }));
            })
            .await;

        let client =
            GenerationClient::new(config(server.url("/v1/chat/completions"))).expect("builds");
        let err = client
            .generate("ctx", "q", 0.5)
            .await
            .expect_err("must fail");
        assert!(matches!(err, GenerationError::BadResponse(_)), "got {err:?}");
    }
}
