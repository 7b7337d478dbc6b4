//! Erreurs HTTP et correspondance avec les erreurs internes

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use landcover::LandcoverError;
use serde_json::json;
use tracing::error;

use crate::ingest::IngestError;
use crate::store::StoreError;

/// Erreur renvoyée au client sous la forme `{"detail": "..."}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateGeometry => ApiError::bad_request(err.to_string()),
            StoreError::Integrity { detail } => ApiError::bad_request(format!(
                "Unexpected error occurred - detailed description here: {}",
                detail
            )),
            StoreError::Pool(e) => {
                error!("Connection pool error: {e}");
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
            }
            StoreError::Postgres(e) => {
                error!("Database error: {e:?}");
                ApiError::internal()
            }
            StoreError::Geometry(reason) => ApiError::bad_request(format!("Invalid geometry: {}", reason)),
        }
    }
}

impl From<LandcoverError> for ApiError {
    fn from(err: LandcoverError) -> Self {
        if err.is_validation() {
            return ApiError::bad_request(err.to_string());
        }
        match &err {
            LandcoverError::Upstream { url, status, .. } => {
                error!("{err}");
                ApiError::new(
                    StatusCode::BAD_GATEWAY,
                    format!("Upstream request to {} failed with status {}", url, status),
                )
            }
            LandcoverError::Http(e) => {
                error!("Upstream transport error: {e}");
                let url = e.url().map(|u| u.to_string()).unwrap_or_default();
                ApiError::new(
                    StatusCode::BAD_GATEWAY,
                    format!("Upstream request to {} failed: {}", url, e),
                )
            }
            LandcoverError::InvalidResponse(_) => {
                error!("{err}");
                ApiError::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
            _ => {
                error!("Unexpected land cover error: {err}");
                ApiError::internal()
            }
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Invalid(e) | IngestError::Summarize(e) => e.into(),
            IngestError::Store(e) => e.into(),
        }
    }
}
