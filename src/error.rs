//! HTTP fault boundary.
//!
//! Internal operations return typed results; this is the single place where
//! faults become the external JSON error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Faults a request can end in.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The upload was missing, empty, or not a decodable image.
    #[error("{0}")]
    InvalidUpload(String),

    /// The OCR engine failed on an otherwise acceptable upload.
    #[error("recognition failed: {0}")]
    Recognition(#[from] anyhow::Error),
}

/// JSON error envelope returned on every fault path.
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::InvalidUpload(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::Recognition(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("recognition failed: {:#}", err),
            ),
        };

        error!("request failed ({}): {}", status, detail);
        (status, Json(ErrorBody { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_upload_maps_to_400() {
        let response = ApiError::InvalidUpload("No file uploaded".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn recognition_fault_maps_to_500() {
        let response =
            ApiError::Recognition(anyhow::anyhow!("engine exploded")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn recognition_display_includes_cause() {
        let err = ApiError::Recognition(anyhow::anyhow!("bad pixels"));
        assert_eq!(err.to_string(), "recognition failed: bad pixels");
    }
}
