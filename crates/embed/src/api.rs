use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::{ApiFormat, EmbedderConfig};
use crate::error::EmbedError;
use crate::normalize::l2_normalize_in_place;

#[derive(Debug, Deserialize)]
struct OpenAiDatum {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiDatum>,
}

fn build_payload(cfg: &EmbedderConfig, texts: &[&str]) -> Value {
    match cfg.api_format {
        ApiFormat::OpenAi => json!({
            "model": cfg.model_name,
            "input": texts,
        }),
        ApiFormat::Raw => json!({
            "inputs": texts,
        }),
    }
}

fn parse_vectors(cfg: &EmbedderConfig, body: Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    match cfg.api_format {
        ApiFormat::OpenAi => {
            let parsed: OpenAiResponse = serde_json::from_value(body)
                .map_err(|e| EmbedError::BadResponse(e.to_string()))?;
            Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
        }
        ApiFormat::Raw => {
            serde_json::from_value(body).map_err(|e| EmbedError::BadResponse(e.to_string()))
        }
    }
}

/// One HTTP round trip for a batch of texts. Order in = order out.
pub(crate) async fn embed_via_api(
    http: &reqwest::Client,
    cfg: &EmbedderConfig,
    texts: &[&str],
) -> Result<Vec<Vec<f32>>, EmbedError> {
    let url = cfg
        .api_url
        .as_deref()
        .ok_or_else(|| EmbedError::InvalidConfig("api_url is required for api mode".into()))?;

    let mut request = http.post(url).json(&build_payload(cfg, texts));
    if let Some(auth) = &cfg.api_auth_header {
        request = request.header(AUTHORIZATION, auth);
    }

    let response = request
        .send()
        .await
        .map_err(|e| EmbedError::Unavailable(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, "embedding endpoint answered with failure status");
        return Err(EmbedError::Unavailable(format!(
            "endpoint answered {status}: {body}"
        )));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| EmbedError::BadResponse(e.to_string()))?;
    let mut vectors = parse_vectors(cfg, body)?;

    if vectors.len() != texts.len() {
        return Err(EmbedError::BadResponse(format!(
            "endpoint returned {} embeddings for {} inputs",
            vectors.len(),
            texts.len()
        )));
    }
    for vector in &mut vectors {
        if vector.len() != cfg.dimension {
            return Err(EmbedError::WrongDimension {
                expected: cfg.dimension,
                got: vector.len(),
            });
        }
        if cfg.normalize {
            l2_normalize_in_place(vector);
        }
    }

    Ok(vectors)
}
