use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{PostFilter, RepositoryProfile, ScoredProfile};

/// One result of a nearest-neighbour search over a single vector field.
#[derive(Debug, Clone)]
pub struct FieldHit {
    pub id: Uuid,
    pub profile: RepositoryProfile,
    pub score: f32,
}

/// Combine the general-field and documentation-field result lists.
///
/// Pipeline:
/// 1. Union both lists, general hits first.
/// 2. Deduplicate by stable id; the first occurrence wins, scores are not blended.
/// 3. Drop hits scoring below `min_score`.
/// 4. Apply the tags/owners post-filter.
/// 5. Stable sort by score descending, then keep at most `limit`.
pub fn merge_field_hits(
    general: Vec<FieldHit>,
    documentation: Vec<FieldHit>,
    min_score: f32,
    post_filter: &PostFilter,
    limit: usize,
) -> Vec<ScoredProfile> {
    let mut seen: HashSet<Uuid> = HashSet::new();

    let mut results: Vec<ScoredProfile> = general
        .into_iter()
        .chain(documentation)
        .filter(|hit| seen.insert(hit.id))
        .filter(|hit| hit.score >= min_score)
        .filter(|hit| post_filter.matches(&hit.profile))
        .map(|hit| ScoredProfile {
            id: hit.id,
            profile: hit.profile,
            score: hit.score,
        })
        .collect();

    // `sort_by` is stable, so equal scores keep union order
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(limit);
    results
}
