use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CatalogError, ErrorKind};

/// Canonical, validated description of one repository.
///
/// Built by [`crate::profile::ProfileBuilder`]; `repository_key` is the
/// natural key used for upserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryProfile {
    pub repository_key: String,
    pub name: Option<String>,
    pub team: Option<String>,
    pub summary: Option<String>,
    pub owners: Vec<String>,
    pub responsibilities: Vec<String>,
    pub dependencies: Vec<String>,
    pub tags: Vec<String>,
    pub documentation_summaries: Vec<String>,
}

/// A profile as persisted: the core record plus identity and embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    pub id: Uuid,
    pub profile: RepositoryProfile,
    pub general_embedding: Vec<f32>,
    pub documentation_embedding: Vec<f32>,
    pub updated_at: DateTime<Utc>,
}

/// A profile returned by a search, with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredProfile {
    pub id: Uuid,
    #[serde(flatten)]
    pub profile: RepositoryProfile,
    pub score: f32,
}

/// Typed contents of the per-repository metadata file. Every field is
/// optional; absent fields decode to empty values.
///
/// ```json
/// {
///   "name": "payments-service",
///   "summary": "Payment service for Adyen",
///   "team": "payments-platform",
///   "responsibilities": ["create-payment", "refund"],
///   "dependencies": ["ledger-service", "fx-rate-service"],
///   "tags": ["dotnet", "kafka"],
///   "docs": ["docs/overview.md"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RepoMetadata {
    pub name: Option<String>,
    pub summary: Option<String>,
    pub team: Option<String>,
    pub responsibilities: Vec<String>,
    pub dependencies: Vec<String>,
    pub tags: Vec<String>,
    pub docs: Vec<String>,
}

impl RepoMetadata {
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(text)
            .map_err(|e| CatalogError::validation("metadata", format!("malformed metadata file: {e}")))
    }
}

/// Equality constraints evaluated before nearest-neighbour ranking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreFilter {
    pub repository: Option<String>,
    pub name: Option<String>,
    pub team: Option<String>,
}

impl PreFilter {
    pub fn matches(&self, profile: &RepositoryProfile) -> bool {
        fn eq(expected: &Option<String>, actual: Option<&str>) -> bool {
            match expected.as_deref().map(str::trim) {
                None | Some("") => true,
                Some(want) => actual == Some(want),
            }
        }

        // Stored keys are normalized; compare like with like
        let repository = self.repository.as_deref().map(crate::profile::repository_key);
        eq(&repository, Some(profile.repository_key.as_str()))
            && eq(&self.name, profile.name.as_deref())
            && eq(&self.team, profile.team.as_deref())
    }
}

/// Attribute constraints applied to candidates after both vector searches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub tags: Option<Vec<String>>,
    pub owners: Option<Vec<String>>,
}

impl PostFilter {
    fn supplied(values: &Option<Vec<String>>) -> Option<&[String]> {
        values.as_deref().filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        Self::supplied(&self.tags).is_none() && Self::supplied(&self.owners).is_none()
    }

    /// Keeps a profile whose tags or owners share at least one value
    /// (case-insensitive) with the corresponding supplied filter list.
    pub fn matches(&self, profile: &RepositoryProfile) -> bool {
        if self.is_empty() {
            return true;
        }

        let intersects = |wanted: Option<&[String]>, stored: &[String]| {
            wanted.is_some_and(|wanted| {
                wanted
                    .iter()
                    .any(|w| stored.iter().any(|s| s.eq_ignore_ascii_case(w.trim())))
            })
        };

        intersects(Self::supplied(&self.tags), &profile.tags)
            || intersects(Self::supplied(&self.owners), &profile.owners)
    }
}

/// Optional filter accepted by the ask operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AskFilter {
    pub repository: Option<String>,
    pub name: Option<String>,
    pub team: Option<String>,
    pub tags: Option<Vec<String>>,
    pub owners: Option<Vec<String>>,
    /// Requested result count; out-of-range values fall back to the default.
    pub k: Option<i64>,
}

impl AskFilter {
    pub fn pre_filter(&self) -> PreFilter {
        PreFilter {
            repository: self.repository.clone(),
            name: self.name.clone(),
            team: self.team.clone(),
        }
    }

    pub fn post_filter(&self) -> PostFilter {
        PostFilter {
            tags: self.tags.clone(),
            owners: self.owners.clone(),
        }
    }
}

/// Ask request
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub filter: AskFilter,
}

/// Ask response
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub results: Vec<ScoredProfile>,
}

/// Query string for the list-processed operation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListReposQuery {
    pub limit: Option<i64>,
}

/// One repository that did not make it into the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoFailure {
    pub repository: String,
    pub kind: ErrorKind,
    pub reason: String,
}

impl RepoFailure {
    pub fn new(repository: impl Into<String>, err: &CatalogError) -> Self {
        Self {
            repository: repository.into(),
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

/// Outcome of a bulk upsert, per repository key.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpsertReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<RepoFailure>,
}

/// Outcome of one refresh run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionReport {
    pub processed: Vec<String>,
    pub succeeded: Vec<String>,
    pub failed: Vec<RepoFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(tags: &[&str], owners: &[&str]) -> RepositoryProfile {
        RepositoryProfile {
            repository_key: "https://example.com/acme/payments".to_string(),
            name: Some("payments".to_string()),
            team: Some("payments-platform".to_string()),
            summary: None,
            owners: owners.iter().map(|s| s.to_string()).collect(),
            responsibilities: vec!["refund".to_string()],
            dependencies: Vec::new(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            documentation_summaries: Vec::new(),
        }
    }

    #[test]
    fn test_metadata_missing_fields_default_to_empty() {
        let meta = RepoMetadata::from_json(r#"{"name": "payments-service"}"#).unwrap();
        assert_eq!(meta.name.as_deref(), Some("payments-service"));
        assert!(meta.team.is_none());
        assert!(meta.responsibilities.is_empty());
        assert!(meta.docs.is_empty());
    }

    #[test]
    fn test_metadata_wrong_type_is_validation_error() {
        let err = RepoMetadata::from_json(r#"{"tags": "kafka"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_pre_filter_equality() {
        let p = profile(&[], &[]);
        assert!(PreFilter::default().matches(&p));
        let team = PreFilter {
            team: Some("payments-platform".to_string()),
            ..Default::default()
        };
        assert!(team.matches(&p));
        let other = PreFilter {
            name: Some("ledger".to_string()),
            ..Default::default()
        };
        assert!(!other.matches(&p));
        let blank = PreFilter {
            repository: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank.matches(&p));
    }

    #[test]
    fn test_pre_filter_normalizes_repository() {
        let mut p = profile(&[], &[]);
        p.repository_key = "https://github.com/acme/payments".to_string();
        for raw in [
            "https://github.com/acme/payments",
            "https://github.com/acme/payments.git",
            "https://github.com/acme/payments/",
            "  https://github.com/acme/payments.git  ",
        ] {
            let filter = PreFilter {
                repository: Some(raw.to_string()),
                ..Default::default()
            };
            assert!(filter.matches(&p), "{raw} should match");
        }
        let other = PreFilter {
            repository: Some("https://github.com/acme/ledger.git".to_string()),
            ..Default::default()
        };
        assert!(!other.matches(&p));
    }

    #[test]
    fn test_post_filter_intersects_case_insensitively() {
        let p = profile(&["Kafka", "refund"], &["alice"]);
        let tags = PostFilter {
            tags: Some(vec!["KAFKA".to_string(), "grpc".to_string()]),
            owners: None,
        };
        assert!(tags.matches(&p));

        let owners_only = PostFilter {
            tags: Some(vec!["grpc".to_string()]),
            owners: Some(vec!["Alice".to_string()]),
        };
        assert!(owners_only.matches(&p));

        let none = PostFilter {
            tags: Some(vec!["grpc".to_string()]),
            owners: Some(vec!["carol".to_string()]),
        };
        assert!(!none.matches(&p));
    }

    #[test]
    fn test_post_filter_empty_lists_keep_everything() {
        let p = profile(&[], &[]);
        let filter = PostFilter {
            tags: Some(Vec::new()),
            owners: None,
        };
        assert!(filter.is_empty());
        assert!(filter.matches(&p));
    }

    #[test]
    fn test_scored_profile_flattens_fields() {
        let scored = ScoredProfile {
            id: Uuid::new_v4(),
            profile: profile(&["kafka"], &[]),
            score: 0.75,
        };
        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["repository_key"], "https://example.com/acme/payments");
        assert_eq!(json["score"], 0.75);
        assert!(json.get("general_embedding").is_none());
    }
}
