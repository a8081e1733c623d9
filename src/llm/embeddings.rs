//! Embedding requests for profile texts and questions.
//!
//! The catalog embeds at most two texts at a time (a profile's general and
//! documentation texts, or one question), so every call is a single request.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

/// Upper bound on characters sent per input. Profile texts are short; long
/// documentation summary lists are cut here rather than rejected upstream.
const MAX_EMBED_CHARS: usize = 6_000;

/// Embed `texts` with the configured provider, one vector per input in
/// input order. Blank inputs are rejected before any request is made.
pub async fn embed_texts(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[&str],
) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) {
        anyhow::bail!("Refusing to embed blank input at position {i}");
    }

    let input: Vec<String> = texts
        .iter()
        .map(|t| truncate_for_embedding(t).to_string())
        .collect();

    let vectors = match config.provider.as_str() {
        "ollama" => {
            let req = OllamaEmbedRequest {
                model: &config.embedding_model,
                input,
                truncate: true,
            };
            let url = format!("{}/api/embed", config.base_url);
            let body: OllamaEmbedResponse = post_json(client, &url, None, &req, "Ollama").await?;
            body.embeddings
        }
        "openai" => {
            let req = OpenAiEmbedRequest {
                model: &config.embedding_model,
                input,
            };
            let url = format!("{}/v1/embeddings", config.base_url);
            let body: OpenAiEmbedResponse =
                post_json(client, &url, config.api_key.as_deref(), &req, "OpenAI").await?;
            body.into_ordered()
        }
        other => anyhow::bail!("Unknown LLM provider: {other}"),
    };

    if vectors.len() != texts.len() {
        anyhow::bail!(
            "Embedding API returned {} vectors for {} inputs",
            vectors.len(),
            texts.len()
        );
    }
    Ok(vectors)
}

/// Cut `text` to at most `MAX_EMBED_CHARS` bytes on a UTF-8 boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    api_key: Option<&str>,
    req: &Req,
    provider: &str,
) -> Result<Resp> {
    let mut builder = client.post(url).json(req);
    if let Some(key) = api_key {
        builder = builder.bearer_auth(key);
    }

    let resp = builder
        .send()
        .await
        .with_context(|| format!("Failed to call {provider} embed API"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("{provider} embed API returned {status}: {body}");
    }

    resp.json()
        .await
        .with_context(|| format!("Failed to parse {provider} embed response"))
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: Vec<String>,
    /// Let Ollama cut inputs longer than the model context
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct OpenAiEmbedRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedResponse {
    /// Vectors in request order; the API reports order through `index`.
    fn into_ordered(self) -> Vec<Vec<f32>> {
        let mut data = self.data;
        data.sort_by_key(|d| d.index);
        data.into_iter().map(|d| d.embedding).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_for_embedding("repo: acme/payments\n"), "repo: acme/payments\n");
    }

    #[test]
    fn test_truncate_splits_on_char_boundary() {
        let text = "é".repeat(MAX_EMBED_CHARS);
        let truncated = truncate_for_embedding(&text);
        assert!(truncated.len() <= MAX_EMBED_CHARS);
        assert!(text.is_char_boundary(truncated.len()));
    }

    #[test]
    fn test_openai_response_reordered_by_index() {
        let body: OpenAiEmbedResponse = serde_json::from_str(
            r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_ordered(), vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_ollama_request_shape() {
        let req = OllamaEmbedRequest {
            model: "nomic-embed-text",
            input: vec!["repo: acme/payments".to_string()],
            truncate: true,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "nomic-embed-text");
        assert_eq!(json["input"][0], "repo: acme/payments");
        assert_eq!(json["truncate"], true);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_request() {
        let client = reqwest::Client::new();
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..LlmConfig::default()
        };
        let result = embed_texts(&client, &config, &[]).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_blank_input_rejected_before_request() {
        let client = reqwest::Client::new();
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..LlmConfig::default()
        };
        let err = embed_texts(&client, &config, &["repo: acme/a", "  "])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("blank input at position 1"));
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let client = reqwest::Client::new();
        let config = LlmConfig {
            provider: "bedrock".to_string(),
            ..LlmConfig::default()
        };
        let err = embed_texts(&client, &config, &["text"]).await.unwrap_err();
        assert!(err.to_string().contains("Unknown LLM provider"));
    }
}
