use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{CatalogError, ErrorKind};

/// API-layer error: a [`CatalogError`] rendered as a JSON body with a
/// status code.
#[derive(Debug)]
pub enum ApiError {
    Catalog(CatalogError),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorKind,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Catalog(err) => {
                let status = match &err {
                    CatalogError::Validation { .. } | CatalogError::InvalidArgument(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    CatalogError::Provider { .. } => StatusCode::BAD_GATEWAY,
                    CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    CatalogError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, err.kind(), err.to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!("Request failed ({status}): {message}");
        }

        (status, Json(ErrorBody { error: kind, message })).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: CatalogError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(CatalogError::validation("responsibilities", "empty")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CatalogError::InvalidArgument("blank".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CatalogError::provider("embed", anyhow::anyhow!("down"))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(CatalogError::Store("disk full".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of(CatalogError::Cancelled), StatusCode::SERVICE_UNAVAILABLE);
    }
}
