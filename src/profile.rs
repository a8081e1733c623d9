//! Turns raw repository metadata into a validated [`RepositoryProfile`] and
//! renders the two canonical texts that get embedded.
//!
//! Everything here is pure: documents are summarized before `build` is
//! called, and the renderings depend only on field values, so the same
//! input always produces byte-identical text.

use std::fmt::Write as _;

use crate::error::{CatalogError, Result};
use crate::models::{RepoMetadata, RepositoryProfile};

pub struct ProfileBuilder;

impl ProfileBuilder {
    /// Validate and normalize gathered data into a profile.
    ///
    /// `owners_text` is the raw owners file (`None` when the file is
    /// missing); `documentation_summaries` are already-summarized documents
    /// in metadata order.
    pub fn build(
        repository_key: &str,
        metadata: RepoMetadata,
        owners_text: Option<&str>,
        documentation_summaries: Vec<String>,
    ) -> Result<RepositoryProfile> {
        let repository_key = repository_key.trim();
        if repository_key.is_empty() {
            return Err(CatalogError::validation(
                "repository_key",
                "must not be blank",
            ));
        }

        let profile = RepositoryProfile {
            repository_key: repository_key.to_string(),
            name: non_blank(metadata.name),
            team: non_blank(metadata.team),
            summary: non_blank(metadata.summary),
            owners: owners_text.map(parse_owners).unwrap_or_default(),
            responsibilities: normalize_list("responsibilities", metadata.responsibilities)?,
            dependencies: normalize_list("dependencies", metadata.dependencies)?,
            tags: normalize_list("tags", metadata.tags)?,
            documentation_summaries: normalize_list(
                "documentation_summaries",
                documentation_summaries,
            )?,
        };

        validate(&profile)?;
        Ok(profile)
    }
}

/// Check the invariants every stored profile must satisfy.
pub fn validate(profile: &RepositoryProfile) -> Result<()> {
    if profile.repository_key.trim().is_empty() {
        return Err(CatalogError::validation(
            "repository_key",
            "must not be blank",
        ));
    }
    if profile.responsibilities.is_empty() {
        return Err(CatalogError::validation(
            "responsibilities",
            "at least one responsibility is required",
        ));
    }

    let lists: [(&str, &[String]); 5] = [
        ("owners", &profile.owners),
        ("responsibilities", &profile.responsibilities),
        ("dependencies", &profile.dependencies),
        ("tags", &profile.tags),
        ("documentation_summaries", &profile.documentation_summaries),
    ];
    for (field, values) in lists {
        ensure_no_blank(field, values)?;
    }
    Ok(())
}

/// Render the general-profile text: one `key: value` line per present
/// field, in a fixed order. Absent optional fields produce no line.
pub fn general_text(profile: &RepositoryProfile) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "repo: {}", profile.repository_key);

    let scalars = [
        ("name", &profile.name),
        ("team", &profile.team),
        ("summary", &profile.summary),
    ];
    for (key, value) in scalars {
        if let Some(value) = value {
            let _ = writeln!(text, "{key}: {value}");
        }
    }

    let lists = [
        ("owners", &profile.owners),
        ("responsibilities", &profile.responsibilities),
        ("tags", &profile.tags),
        ("dependencies", &profile.dependencies),
    ];
    for (key, values) in lists {
        if !values.is_empty() {
            let _ = writeln!(text, "{key}: [{}]", values.join(", "));
        }
    }

    text
}

/// Render the documentation text: each summary on its own line, in input
/// order. Empty when the repository has no documents.
pub fn documentation_text(profile: &RepositoryProfile) -> String {
    let mut text = String::new();
    for summary in &profile.documentation_summaries {
        text.push_str(summary);
        text.push('\n');
    }
    text
}

/// Split an owners file into tokens: one per non-empty line.
pub fn parse_owners(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Derive the natural key for a repository URL: trimmed, without trailing
/// slashes or a `.git` suffix.
pub fn repository_key(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    trimmed
        .strip_suffix(".git")
        .unwrap_or(trimmed)
        .to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_list(field: &str, values: Vec<String>) -> Result<Vec<String>> {
    ensure_no_blank(field, &values)?;
    Ok(values.into_iter().map(|v| v.trim().to_string()).collect())
}

fn ensure_no_blank(field: &str, values: &[String]) -> Result<()> {
    if let Some(index) = values.iter().position(|v| v.trim().is_empty()) {
        return Err(CatalogError::validation(
            field,
            format!("entry {index} is blank"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn payments_metadata() -> RepoMetadata {
        RepoMetadata {
            name: Some("payments-service".to_string()),
            team: Some("payments-platform".to_string()),
            responsibilities: vec!["refund".to_string()],
            ..Default::default()
        }
    }

    fn field_of(err: CatalogError) -> String {
        match err {
            CatalogError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_build_payments_profile() {
        let profile = ProfileBuilder::build(
            "https://example.com/acme/payments-service",
            payments_metadata(),
            Some("alice\nbob"),
            Vec::new(),
        )
        .unwrap();

        assert_eq!(profile.owners, vec!["alice", "bob"]);
        assert!(profile.documentation_summaries.is_empty());
        assert_eq!(documentation_text(&profile), "");
        assert_eq!(profile.summary, None);
    }

    #[test]
    fn test_general_text_fixed_order_without_placeholders() {
        let mut meta = payments_metadata();
        meta.tags = vec!["kafka".to_string(), "dotnet".to_string()];
        meta.dependencies = vec!["ledger-service".to_string()];
        let profile = ProfileBuilder::build("acme/payments", meta, Some("alice\n"), Vec::new()).unwrap();

        assert_eq!(
            general_text(&profile),
            "repo: acme/payments\n\
             name: payments-service\n\
             team: payments-platform\n\
             owners: [alice]\n\
             responsibilities: [refund]\n\
             tags: [kafka, dotnet]\n\
             dependencies: [ledger-service]\n"
        );
    }

    #[test]
    fn test_renderings_are_deterministic() {
        let build = || {
            ProfileBuilder::build(
                "acme/payments",
                payments_metadata(),
                Some("alice\nbob\n"),
                vec!["Handles refunds.".to_string(), "Talks to Adyen.".to_string()],
            )
            .unwrap()
        };
        let (a, b) = (build(), build());
        assert_eq!(general_text(&a), general_text(&b));
        assert_eq!(documentation_text(&a), documentation_text(&b));
        assert_eq!(documentation_text(&a), "Handles refunds.\nTalks to Adyen.\n");
    }

    #[test]
    fn test_blank_key_rejected() {
        let err = ProfileBuilder::build("   ", payments_metadata(), None, Vec::new()).unwrap_err();
        assert_eq!(field_of(err), "repository_key");
    }

    #[test]
    fn test_missing_metadata_fails_responsibilities() {
        let err = ProfileBuilder::build("acme/empty", RepoMetadata::default(), None, Vec::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(field_of(err), "responsibilities");
    }

    #[test]
    fn test_blank_entry_fails_whole_profile() {
        let mut meta = payments_metadata();
        meta.tags = vec!["kafka".to_string(), " ".to_string()];
        let err = ProfileBuilder::build("acme/payments", meta, None, Vec::new()).unwrap_err();
        assert_eq!(field_of(err), "tags");

        let err = ProfileBuilder::build(
            "acme/payments",
            payments_metadata(),
            None,
            vec![String::new()],
        )
        .unwrap_err();
        assert_eq!(field_of(err), "documentation_summaries");
    }

    #[test]
    fn test_optional_scalars_are_trimmed_and_blank_dropped() {
        let mut meta = payments_metadata();
        meta.summary = Some("   ".to_string());
        meta.name = Some("  payments-service ".to_string());
        let profile = ProfileBuilder::build("acme/payments", meta, None, Vec::new()).unwrap();
        assert_eq!(profile.summary, None);
        assert_eq!(profile.name.as_deref(), Some("payments-service"));
        assert!(!general_text(&profile).contains("summary"));
    }

    #[test]
    fn test_parse_owners_skips_empty_lines() {
        assert_eq!(parse_owners("alice\r\n\n  bob  \n"), vec!["alice", "bob"]);
        assert!(parse_owners("\n\n").is_empty());
    }

    #[test]
    fn test_repository_key_normalization() {
        assert_eq!(
            repository_key(" https://github.com/acme/payments.git "),
            "https://github.com/acme/payments"
        );
        assert_eq!(
            repository_key("https://github.com/acme/payments/"),
            "https://github.com/acme/payments"
        );
    }
}
