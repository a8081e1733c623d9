use axum::extract::{Query, State};
use axum::Json;
use std::path::Path;

use crate::api::ApiError;
use crate::error::CatalogError;
use crate::models::{IngestionReport, ListReposQuery};
use crate::state::AppState;

/// POST /api/refresh - Re-ingest every repository in the supported list.
///
/// The run is tied to the request: if the client goes away, or the server
/// shuts down, in-flight work is cancelled and nothing is written.
pub async fn refresh(State(state): State<AppState>) -> Result<Json<IngestionReport>, ApiError> {
    let urls = load_supported_repos(&state.config.supported_repos_path).await?;

    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    let report = state.ingest.refresh(&urls, &cancel).await?;
    Ok(Json(report))
}

/// GET /api/repos?limit= - Repository keys already in the catalog
pub async fn list_repos(
    State(state): State<AppState>,
    Query(query): Query<ListReposQuery>,
) -> Json<Vec<String>> {
    Json(state.retrieval.list_processed(query.limit))
}

/// Read the JSON array of repository URLs. A missing file is an invalid
/// argument; an unreadable one is a failed `read`.
async fn load_supported_repos(path: &Path) -> Result<Vec<String>, ApiError> {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CatalogError::InvalidArgument(format!(
                "supported repositories file {} not found",
                path.display()
            ))
            .into());
        }
        Err(e) => {
            return Err(CatalogError::provider(
                "read",
                anyhow::Error::new(e).context(format!("Failed to read {}", path.display())),
            )
            .into());
        }
    };

    serde_json::from_str(&data).map_err(|e| {
        ApiError::from(CatalogError::validation(
            "supported_repos",
            format!("expected a JSON array of URLs: {e}"),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn test_load_supported_repos() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repos.json");
        std::fs::write(&path, r#"["https://github.com/acme/payments-service"]"#).unwrap();

        let urls = load_supported_repos(&path).await.unwrap();
        assert_eq!(urls, vec!["https://github.com/acme/payments-service"]);
    }

    #[tokio::test]
    async fn test_load_supported_repos_missing_or_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_supported_repos(&dir.path().join("nope.json")).await;
        assert!(matches!(
            missing,
            Err(ApiError::Catalog(CatalogError::InvalidArgument(_)))
        ));

        let path = dir.path().join("repos.json");
        std::fs::write(&path, r#"{"repos": []}"#).unwrap();
        let malformed = load_supported_repos(&path).await;
        assert!(matches!(
            malformed,
            Err(ApiError::Catalog(CatalogError::Validation { .. }))
        ));
    }

    #[tokio::test]
    async fn test_unreadable_supported_repos_is_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A directory exists but cannot be read as a file
        let result = load_supported_repos(dir.path()).await;
        match result {
            Err(ApiError::Catalog(err)) => {
                assert!(matches!(err, CatalogError::Provider { operation: "read", .. }));
                let response = ApiError::from(err).into_response();
                assert_eq!(response.status(), axum::http::StatusCode::BAD_GATEWAY);
            }
            other => panic!("expected read failure, got {other:?}"),
        }
    }
}
