//! Error types and HTTP status mapping

use crate::limits::TooLarge;
use crate::multipart::DecodeError;
use crate::response::ErrorBody;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pinbox_store::StoreError;
use thiserror::Error;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("S3 credentials or FOUR_BUCKET not set")]
    ConfigurationMissing,

    #[error("Malformed multipart body: {0}")]
    MalformedBody(String),

    #[error("No file uploaded (expected a multipart field named \"file\")")]
    FileMissing,

    #[error("Uploaded file is empty")]
    EmptyFile,

    #[error(transparent)]
    TooLarge(#[from] TooLarge),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Malformed(message) => Self::MalformedBody(message),
            DecodeError::FileMissing => Self::FileMissing,
            DecodeError::EmptyFile => Self::EmptyFile,
            DecodeError::TooLarge(too_large) => Self::TooLarge(too_large),
        }
    }
}

impl ApiError {
    /// Short machine-readable code, sent as `x-error-code`
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing => "ConfigurationMissing",
            Self::MalformedBody(_) => "MalformedBody",
            Self::FileMissing => "FileMissing",
            Self::EmptyFile => "EmptyFile",
            Self::TooLarge(_) => "TooLarge",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::NotFound => "NotFound",
            Self::Storage(StoreError::Rejected(_)) => "StorageRejected",
            Self::Storage(_) => "StorageUnavailable",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedBody(_) | Self::FileMissing | Self::EmptyFile => StatusCode::BAD_REQUEST,
            Self::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ConfigurationMissing | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(code, error = %self, "Request failed");
        } else {
            tracing::debug!(code, error = %self, "Request rejected");
        }

        (
            status,
            [("x-error-code", code)],
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
