use anyhow::Context;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{CatalogError, Result};
use crate::llm::EmbeddingProvider;
use crate::models::{
    PostFilter, PreFilter, RepoFailure, RepositoryProfile, ScoredProfile, StoredProfile,
    UpsertReport,
};
use crate::profile;
use crate::search::merge::{merge_field_hits, FieldHit};

/// The two independently searchable vector fields of a stored profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorField {
    General,
    Documentation,
}

impl VectorField {
    pub fn as_str(self) -> &'static str {
        match self {
            VectorField::General => "general_embedding",
            VectorField::Documentation => "documentation_embedding",
        }
    }

    fn vector(self, entry: &StoredProfile) -> &[f32] {
        match self {
            VectorField::General => &entry.general_embedding,
            VectorField::Documentation => &entry.documentation_embedding,
        }
    }
}

/// Profile collection keyed by `repository_key`, with a general and a
/// documentation vector per profile. Held in memory and persisted to disk
/// as JSON after every bulk upsert.
pub struct VectorStore {
    entries: RwLock<Vec<StoredProfile>>,
    persist_path: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    dimension: usize,
    num_candidates: usize,
}

impl VectorStore {
    pub fn open_or_create(
        catalog_dir: &Path,
        embedder: Arc<dyn EmbeddingProvider>,
        dimension: usize,
        num_candidates: usize,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(catalog_dir)?;
        let persist_path = catalog_dir.join("profiles.json");

        let entries: Vec<StoredProfile> = if persist_path.exists() {
            let data = std::fs::read_to_string(&persist_path)
                .context("Failed to read catalog file")?;
            serde_json::from_str(&data).context("Failed to parse catalog file")?
        } else {
            Vec::new()
        };
        tracing::info!(
            "Catalog opened at {} with {} profiles",
            persist_path.display(),
            entries.len()
        );

        Ok(Self {
            entries: RwLock::new(entries),
            persist_path,
            embedder,
            dimension,
            num_candidates,
        })
    }

    /// Embed and upsert a batch of profiles by `repository_key`.
    ///
    /// Each profile is fully replaced (both embeddings recomputed) or created
    /// with a fresh id. A profile whose embedding fails is reported and
    /// skipped; the rest of the batch is still written. The whole batch is
    /// persisted in one write, and `Err` is only returned when that write
    /// fails, in which case nothing from the batch is applied.
    pub async fn upsert_all(&self, profiles: Vec<RepositoryProfile>) -> Result<UpsertReport> {
        let mut report = UpsertReport::default();
        let mut prepared = Vec::with_capacity(profiles.len());

        for profile in profiles {
            match self.embed_profile(&profile).await {
                Ok((general, documentation)) => prepared.push((profile, general, documentation)),
                Err(e) => {
                    tracing::warn!("Skipping {} in upsert: {e}", profile.repository_key);
                    report
                        .failed
                        .push(RepoFailure::new(profile.repository_key.clone(), &e));
                }
            }
        }

        if prepared.is_empty() {
            return Ok(report);
        }

        let mut entries = self.entries.write();
        let mut next = entries.clone();
        let mut positions: HashMap<String, usize> = next
            .iter()
            .enumerate()
            .map(|(i, e)| (e.profile.repository_key.clone(), i))
            .collect();
        let now = Utc::now();

        for (profile, general_embedding, documentation_embedding) in prepared {
            let key = profile.repository_key.clone();
            match positions.get(&key) {
                Some(&i) => {
                    let existing = &mut next[i];
                    existing.profile = profile;
                    existing.general_embedding = general_embedding;
                    existing.documentation_embedding = documentation_embedding;
                    existing.updated_at = now;
                }
                None => {
                    positions.insert(key.clone(), next.len());
                    next.push(StoredProfile {
                        id: Uuid::new_v4(),
                        profile,
                        general_embedding,
                        documentation_embedding,
                        updated_at: now,
                    });
                }
            }
            report.succeeded.push(key);
        }

        persist(&self.persist_path, &next)
            .map_err(|e| CatalogError::Store(format!("{e:#}")))?;
        *entries = next;

        tracing::info!(
            "Upserted {} profiles ({} failed)",
            report.succeeded.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Both embeddings for one profile, requested in a single provider call.
    ///
    /// A profile without documentation gets the zero vector as its
    /// documentation embedding; blank text is never sent to the provider.
    async fn embed_profile(&self, profile: &RepositoryProfile) -> Result<(Vec<f32>, Vec<f32>)> {
        profile::validate(profile)?;

        let general_text = profile::general_text(profile);
        let documentation_text = profile::documentation_text(profile);
        let has_docs = !documentation_text.trim().is_empty();

        let mut texts = vec![general_text.as_str()];
        if has_docs {
            texts.push(documentation_text.as_str());
        }

        let mut vectors = self
            .embedder
            .embed_many(&texts)
            .await
            .map_err(|e| CatalogError::provider("embed", e))?
            .into_iter();
        let mut next = |field: VectorField| {
            vectors.next().ok_or_else(|| {
                CatalogError::provider(
                    "embed",
                    anyhow::anyhow!("no vector returned for {}", field.as_str()),
                )
            })
        };

        let general = next(VectorField::General)?;
        let documentation = if has_docs {
            next(VectorField::Documentation)?
        } else {
            vec![0.0; self.dimension]
        };

        for (field, vector) in [
            (VectorField::General, &general),
            (VectorField::Documentation, &documentation),
        ] {
            if vector.len() != self.dimension {
                return Err(CatalogError::Store(format!(
                    "{} has {} dimensions, index expects {}",
                    field.as_str(),
                    vector.len(),
                    self.dimension
                )));
            }
        }
        Ok((general, documentation))
    }

    /// Search both vector fields and merge the results.
    ///
    /// Returns at most `limit` profiles, unique by id, each scoring at least
    /// `min_score`, sorted by score descending.
    pub fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
        pre_filter: &PreFilter,
        post_filter: &PostFilter,
    ) -> Result<Vec<ScoredProfile>> {
        if !(0.0..=1.0).contains(&min_score) {
            return Err(CatalogError::InvalidArgument(format!(
                "min_score must be within [0, 1], got {min_score}"
            )));
        }
        if query_embedding.len() != self.dimension {
            return Err(CatalogError::InvalidArgument(format!(
                "query vector has {} dimensions, index expects {}",
                query_embedding.len(),
                self.dimension
            )));
        }

        let general = self.nearest(VectorField::General, query_embedding, limit, pre_filter);
        let documentation =
            self.nearest(VectorField::Documentation, query_embedding, limit, pre_filter);
        tracing::debug!(
            "Vector search: {} general hits, {} documentation hits",
            general.len(),
            documentation.len()
        );

        Ok(merge_field_hits(
            general,
            documentation,
            min_score,
            post_filter,
            limit,
        ))
    }

    /// Nearest neighbours on one field, restricted by the pre-filter.
    /// Scores are cosine similarity mapped into [0, 1].
    pub fn nearest(
        &self,
        field: VectorField,
        query_embedding: &[f32],
        limit: usize,
        pre_filter: &PreFilter,
    ) -> Vec<FieldHit> {
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &StoredProfile)> = entries
            .iter()
            .filter(|e| pre_filter.matches(&e.profile))
            .map(|e| (similarity_score(query_embedding, field.vector(e)), e))
            .collect();

        // Sort descending by score
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        // Candidate pool is independent of `limit`; `merge_field_hits` applies the final cut
        scored.truncate(self.num_candidates.max(limit));

        scored
            .into_iter()
            .map(|(score, e)| FieldHit {
                id: e.id,
                profile: e.profile.clone(),
                score,
            })
            .collect()
    }

    /// Up to `limit` stored repository keys, in storage order.
    pub fn list_keys(&self, limit: usize) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .take(limit)
            .map(|e| e.profile.repository_key.clone())
            .collect()
    }

    pub fn get(&self, repository_key: &str) -> Option<StoredProfile> {
        self.entries
            .read()
            .iter()
            .find(|e| e.profile.repository_key == repository_key)
            .cloned()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }
}

/// Atomic write via temp file + rename.
fn persist(path: &Path, entries: &[StoredProfile]) -> anyhow::Result<()> {
    let data = serde_json::to_string(entries)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, data)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Cosine similarity rescaled from [-1, 1] to [0, 1].
fn similarity_score(a: &[f32], b: &[f32]) -> f32 {
    (1.0 + cosine_similarity(a, b)) / 2.0
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
