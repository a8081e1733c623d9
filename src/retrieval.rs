use std::sync::Arc;

use crate::error::{CatalogError, Result};
use crate::llm::EmbeddingProvider;
use crate::models::{AskFilter, ScoredProfile};
use crate::search::VectorStore;

/// Result count used when the caller's `k` is missing or out of range.
pub const DEFAULT_K: usize = 8;
pub const MAX_K: i64 = 100;

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;

/// Answers natural-language questions against the catalog.
pub struct RetrievalEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<VectorStore>,
    min_score: f32,
}

impl RetrievalEngine {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<VectorStore>, min_score: f32) -> Self {
        Self {
            embedder,
            store,
            min_score,
        }
    }

    /// Embed `question` and return the best-matching profiles.
    ///
    /// The pre-filter (repository/name/team) narrows the candidates before
    /// similarity ranking; the post-filter (tags/owners) is applied to the
    /// merged results.
    pub async fn ask(&self, question: &str, filter: &AskFilter) -> Result<Vec<ScoredProfile>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "question must not be empty".to_string(),
            ));
        }

        let k = effective_k(filter.k);
        let query_embedding = self
            .embedder
            .embed(question)
            .await
            .map_err(|e| CatalogError::provider("embed", e))?;

        let results = self.store.search(
            &query_embedding,
            k,
            self.min_score,
            &filter.pre_filter(),
            &filter.post_filter(),
        )?;
        tracing::info!("Ask returned {} results (k={k})", results.len());
        Ok(results)
    }

    /// Repository keys currently in the catalog.
    pub fn list_processed(&self, limit: Option<i64>) -> Vec<String> {
        self.store.list_keys(effective_list_limit(limit))
    }
}

pub fn effective_k(k: Option<i64>) -> usize {
    match k {
        Some(k) if (1..=MAX_K).contains(&k) => k as usize,
        _ => DEFAULT_K,
    }
}

pub fn effective_list_limit(limit: Option<i64>) -> usize {
    limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT) as usize
}
