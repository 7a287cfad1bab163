use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::response::failure;
use crate::error::Error;
use crate::validate::ValidationError;

/// API-facing error taxonomy: each variant maps to one HTTP status and one
/// stable `errorCode` in the failure envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No session, or the session has no recoverable credential.
    #[error("authentication required")]
    AuthRequired(&'static str),
    /// The multipart form itself could not be read.
    #[error("upload parse failed: {0}")]
    UploadParse(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Token refresh or Drive failure during the upload pipeline.
    #[error(transparent)]
    Upstream(#[from] Error),
    #[error("path not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::AuthRequired(message) => (
                StatusCode::UNAUTHORIZED,
                failure("AUTH_REQUIRED", message, Vec::new()),
            ),
            Self::UploadParse(message) => (
                StatusCode::BAD_REQUEST,
                failure("UPLOAD_PARSE_FAILED", message, Vec::new()),
            ),
            Self::Validation(err) => {
                let (code, details) = match &err {
                    ValidationError::StudentId(_) => ("INVALID_STUDENT_ID", Vec::new()),
                    ValidationError::Date(_) => ("INVALID_DATE", Vec::new()),
                    ValidationError::File { details } => ("INVALID_FILE", details.clone()),
                };
                (
                    StatusCode::BAD_REQUEST,
                    failure(code, err.to_string(), details),
                )
            }
            Self::Upstream(err) => upstream_response(err),
            Self::NotFound(path) => (
                StatusCode::NOT_FOUND,
                failure("NOT_FOUND", format!("Path not found: {path}"), Vec::new()),
            ),
        };
        (status, Json(body)).into_response()
    }
}

fn upstream_response(err: Error) -> (StatusCode, super::response::FailureBody) {
    match &err {
        // The client must re-authenticate, not resubmit the form.
        Error::CredentialRequired | Error::TokenRefresh { .. } => (
            StatusCode::UNAUTHORIZED,
            failure(
                "AUTH_REQUIRED",
                "sign in again before uploading",
                Vec::new(),
            ),
        ),
        Error::DriveResponseMissingId => (
            StatusCode::INTERNAL_SERVER_ERROR,
            failure("DRIVE_RESPONSE_MALFORMED", err.to_string(), Vec::new()),
        ),
        Error::DriveUpload { .. } | Error::DriveList { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            failure("DRIVE_UPLOAD_FAILED", err.to_string(), Vec::new()),
        ),
        _ => {
            tracing::error!(error = %err, "internal error during upload");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                failure("INTERNAL_ERROR", "an unexpected error occurred", Vec::new()),
            )
        }
    }
}
