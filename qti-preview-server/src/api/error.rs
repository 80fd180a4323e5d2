//! Mapping of preview errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use qti_preview_core::PreviewError;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use super::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Preview session not found: {0}")]
    SessionNotFound(Uuid),

    #[error(transparent)]
    Preview(#[from] PreviewError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Preview(e) => match e {
                PreviewError::ItemNotFound(_) => StatusCode::NOT_FOUND,
                PreviewError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
                PreviewError::SessionClosed => StatusCode::GONE,
                PreviewError::EmptyTest => StatusCode::CONFLICT,
                e if e.is_client_error() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            warn!(error = %self, "preview request failed");
        }
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::SessionNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (PreviewError::ItemNotFound("i9".into()).into(), StatusCode::NOT_FOUND),
            (
                PreviewError::PositionOutOfRange { position: 4, total: 2 }.into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                PreviewError::InvalidRequest("jump requires a ref".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                PreviewError::Unsupported("getCatSessionV2".into()).into(),
                StatusCode::NOT_IMPLEMENTED,
            ),
            (PreviewError::SessionClosed.into(), StatusCode::GONE),
            (
                PreviewError::Resolver("bank offline".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.status(), status, "{error}");
        }
    }
}
