//! LLM collaborators: text embedding and document summarization.
//!
//! The rest of the crate only sees the two traits; [`LlmClient`] is the
//! production implementation talking to Ollama or an OpenAI-compatible API.

pub mod embeddings;
pub mod summarize;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::LlmConfig;

/// Text → fixed-length vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// One vector per input, in input order. Providers that accept several
    /// inputs per request should override this.
    async fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Long document text → short summary text.
#[async_trait]
pub trait SummarizationProvider: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// HTTP client for the configured LLM provider.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(http: reqwest::Client, config: LlmConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl EmbeddingProvider for LlmClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        embeddings::embed_texts(&self.http, &self.config, &[text])
            .await?
            .pop()
            .context("No embedding returned")
    }

    async fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        embeddings::embed_texts(&self.http, &self.config, texts).await
    }
}

#[async_trait]
impl SummarizationProvider for LlmClient {
    async fn summarize(&self, text: &str) -> Result<String> {
        summarize::summarize_document(&self.http, &self.config, text).await
    }
}
