use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::git::GitCloner;
use crate::ingest::{IngestSettings, IngestionOrchestrator};
use crate::llm::LlmClient;
use crate::retrieval::RetrievalEngine;
use crate::search::VectorStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<VectorStore>,
    pub ingest: Arc<IngestionOrchestrator>,
    pub retrieval: Arc<RetrievalEngine>,
    /// Cancelled on shutdown; every refresh run holds a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        if !(0.0..=1.0).contains(&config.retrieval.min_score) {
            anyhow::bail!(
                "min_score must be within [0, 1], got {}",
                config.retrieval.min_score
            );
        }
        std::fs::create_dir_all(config.checkouts_dir())
            .context("Failed to create checkouts directory")?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;
        let llm = Arc::new(LlmClient::new(http_client, config.llm.clone()));

        let store = Arc::new(VectorStore::open_or_create(
            &config.catalog_dir(),
            llm.clone(),
            config.llm.embedding_dim,
            config.retrieval.num_candidates,
        )
        .context("Failed to open catalog")?);

        let cloner = Arc::new(GitCloner::new(
            config.git_token.clone(),
            config.git_branch.clone(),
            Duration::from_secs(config.clone_timeout_secs),
        ));
        let ingest = Arc::new(IngestionOrchestrator::new(
            cloner,
            llm.clone(),
            store.clone(),
            IngestSettings::from_config(&config),
        ));
        let retrieval = Arc::new(RetrievalEngine::new(
            llm,
            store.clone(),
            config.retrieval.min_score,
        ));

        Ok(Self {
            config,
            store,
            ingest,
            retrieval,
            shutdown: CancellationToken::new(),
        })
    }
}
