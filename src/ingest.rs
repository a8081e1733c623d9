//! Refresh pipeline: clone → read owners/metadata → summarize docs → build
//! profile, fanned out over repositories, then one bulk upsert.
//!
//! Concurrency is bounded by a semaphore shared across refresh runs. A
//! repository that fails contributes a [`RepoFailure`] to the report and no
//! profile; its siblings are unaffected. Cancelling the token aborts the
//! whole run and nothing is written.

use chrono::Utc;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::git::RepoCloner;
use crate::llm::SummarizationProvider;
use crate::models::{IngestionReport, RepoFailure, RepoMetadata, RepositoryProfile};
use crate::profile::{self, ProfileBuilder};
use crate::search::VectorStore;

#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Parent of the per-run checkout directories
    pub checkouts_root: PathBuf,
    pub metadata_file: String,
    pub owners_file: String,
    pub max_concurrent: usize,
    pub keep_checkouts: bool,
}

impl IngestSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            checkouts_root: config.checkouts_dir(),
            metadata_file: config.metadata_file.clone(),
            owners_file: config.owners_file.clone(),
            max_concurrent: config.max_concurrent_ingest,
            keep_checkouts: config.keep_checkouts,
        }
    }
}

pub struct IngestionOrchestrator {
    worker: Arc<RepoWorker>,
    store: Arc<VectorStore>,
    semaphore: Arc<Semaphore>,
    checkouts_root: PathBuf,
    keep_checkouts: bool,
}

/// Per-repository steps. Shared read-only by all tasks of a run.
struct RepoWorker {
    cloner: Arc<dyn RepoCloner>,
    summarizer: Arc<dyn SummarizationProvider>,
    metadata_file: String,
    owners_file: String,
}

impl IngestionOrchestrator {
    pub fn new(
        cloner: Arc<dyn RepoCloner>,
        summarizer: Arc<dyn SummarizationProvider>,
        store: Arc<VectorStore>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            worker: Arc::new(RepoWorker {
                cloner,
                summarizer,
                metadata_file: settings.metadata_file,
                owners_file: settings.owners_file,
            }),
            store,
            semaphore: Arc::new(Semaphore::new(settings.max_concurrent.max(1))),
            checkouts_root: settings.checkouts_root,
            keep_checkouts: settings.keep_checkouts,
        }
    }

    /// Re-ingest every repository in `repository_urls` and upsert the
    /// profiles that could be built.
    pub async fn refresh(
        &self,
        repository_urls: &[String],
        cancel: &CancellationToken,
    ) -> Result<IngestionReport> {
        if repository_urls.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "no repositories to refresh".to_string(),
            ));
        }
        if let Some(index) = repository_urls.iter().position(|u| u.trim().is_empty()) {
            return Err(CatalogError::InvalidArgument(format!(
                "repository URL at position {index} is blank"
            )));
        }

        let mut seen = HashSet::new();
        let targets: Vec<(String, String)> = repository_urls
            .iter()
            .map(|url| (url.trim().to_string(), profile::repository_key(url)))
            .filter(|(url, key)| {
                let fresh = seen.insert(key.clone());
                if !fresh {
                    tracing::warn!("Ignoring duplicate repository {url}");
                }
                fresh
            })
            .collect();

        let run_dir = RunDir {
            path: self.run_dir(),
            keep: self.keep_checkouts,
        };
        tracing::info!(
            "Refreshing {} repositories into {}",
            targets.len(),
            run_dir.path.display()
        );

        self.run(&targets, &run_dir.path, cancel).await
    }

    async fn run(
        &self,
        targets: &[(String, String)],
        run_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<IngestionReport> {
        let mut handles = Vec::with_capacity(targets.len());
        for (url, key) in targets {
            let worker = Arc::clone(&self.worker);
            let semaphore = Arc::clone(&self.semaphore);
            let cancel = cancel.clone();
            let run_dir = run_dir.to_path_buf();
            let url = url.clone();
            let task_key = key.clone();

            let handle = tokio::spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => Err(CatalogError::Cancelled),
                    result = async {
                        let _permit = semaphore
                            .acquire_owned()
                            .await
                            .map_err(|_| CatalogError::Cancelled)?;
                        worker.ingest(&url, &task_key, &run_dir).await
                    } => result,
                }
            });
            handles.push((key.clone(), handle));
        }

        let mut profiles = Vec::new();
        let mut failed = Vec::new();
        for (key, handle) in handles {
            match handle.await {
                Ok(Ok(profile)) => profiles.push(profile),
                Ok(Err(e)) => {
                    tracing::warn!("Ingestion failed for {key}: {e}");
                    failed.push(RepoFailure::new(key, &e));
                }
                Err(e) => {
                    tracing::error!("Ingestion task for {key} did not complete: {e}");
                    let err = CatalogError::Provider {
                        operation: "ingest",
                        message: e.to_string(),
                    };
                    failed.push(RepoFailure::new(key, &err));
                }
            }
        }

        if cancel.is_cancelled() {
            tracing::warn!("Refresh cancelled; discarding {} built profiles", profiles.len());
            return Err(CatalogError::Cancelled);
        }

        let upsert = tokio::select! {
            _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
            report = self.store.upsert_all(profiles) => report?,
        };

        failed.extend(upsert.failed);
        let report = IngestionReport {
            processed: targets.iter().map(|(_, key)| key.clone()).collect(),
            succeeded: upsert.succeeded,
            failed,
        };
        tracing::info!(
            "Refresh complete: {} processed, {} succeeded, {} failed",
            report.processed.len(),
            report.succeeded.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// A fresh directory name per run, so concurrent refreshes never share
    /// checkouts.
    fn run_dir(&self) -> PathBuf {
        let suffix = Uuid::new_v4().simple().to_string();
        self.checkouts_root
            .join(format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..8]))
    }
}

impl RepoWorker {
    async fn ingest(&self, url: &str, key: &str, run_dir: &Path) -> Result<RepositoryProfile> {
        let checkout = self
            .cloner
            .clone_repo(url, run_dir)
            .await
            .map_err(|e| CatalogError::provider("clone", e))?;

        let owners_text = read_optional(&checkout.join(&self.owners_file)).await?;

        let metadata = match read_optional(&checkout.join(&self.metadata_file)).await? {
            Some(text) => RepoMetadata::from_json(&text)?,
            None => {
                tracing::warn!("{key}: no {} found, using empty metadata", self.metadata_file);
                RepoMetadata::default()
            }
        };

        let summaries = self.summarize_docs(key, &checkout, &metadata.docs).await?;

        let profile = ProfileBuilder::build(key, metadata, owners_text.as_deref(), summaries)?;
        tracing::info!(
            "{key}: profile built ({} owners, {} documents)",
            profile.owners.len(),
            profile.documentation_summaries.len()
        );
        Ok(profile)
    }

    async fn summarize_docs(&self, key: &str, checkout: &Path, docs: &[String]) -> Result<Vec<String>> {
        let mut summaries = Vec::with_capacity(docs.len());

        for (index, doc) in docs.iter().enumerate() {
            if doc.trim().is_empty() {
                return Err(CatalogError::validation(
                    "docs",
                    format!("entry {index} is blank"),
                ));
            }
            let Some(path) = resolve_doc_path(checkout, doc.trim()) else {
                tracing::warn!("{key}: skipping document outside the checkout: {doc}");
                continue;
            };
            let Some(content) = read_optional(&path).await? else {
                tracing::warn!("{key}: document {doc} not found, skipping");
                continue;
            };
            if content.trim().is_empty() {
                tracing::debug!("{key}: document {doc} is empty, skipping");
                continue;
            }

            let summary = self
                .summarizer
                .summarize(&content)
                .await
                .map_err(|e| CatalogError::provider("summarize", e.context(format!("document {doc}"))))?;
            tracing::debug!("{key}: summarized {doc}");
            summaries.push(summary);
        }

        Ok(summaries)
    }
}

/// Read a file, treating a missing file as `None`.
async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CatalogError::provider(
            "read",
            anyhow::Error::new(e).context(format!("Failed to read {}", path.display())),
        )),
    }
}

/// Join a metadata-relative document path onto the checkout, refusing
/// absolute paths and `..` components.
fn resolve_doc_path(checkout: &Path, relative: &str) -> Option<PathBuf> {
    let rel = Path::new(relative);
    let escapes = rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return None;
    }
    Some(checkout.join(rel))
}

/// Checkout root of one refresh run. Removed when dropped unless checkouts
/// are kept, which covers refreshes abandoned mid-flight.
struct RunDir {
    path: PathBuf,
    keep: bool,
}

impl Drop for RunDir {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {e}", self.path.display()),
        }
    }
}
