use std::fmt;

use axum::extract::multipart::MultipartRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::content::ContentMismatch;

/// Every way a request can fail. Each maps to one status and a short
/// plain-text body; internal details stay in the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    RequestTooLarge,
    MissingFile,
    ExtensionNotAllowed,
    ContentMismatch(&'static str),
    StorageWriteFailure,
    Unauthorized,
    NotFound,
    ListingFailure,
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RequestTooLarge
            | ApiError::MissingFile
            | ApiError::ExtensionNotAllowed
            | ApiError::ContentMismatch(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::StorageWriteFailure | ApiError::ListingFailure | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::RequestTooLarge =>
                write!(f, "form too large"),
            ApiError::MissingFile =>
                write!(f, "file required"),
            ApiError::ExtensionNotAllowed =>
                write!(f, "extension not allowed"),
            ApiError::ContentMismatch(sniffed) =>
                write!(f, "content-type mismatch: {}", sniffed),
            ApiError::StorageWriteFailure =>
                write!(f, "failed to store file"),
            ApiError::Unauthorized =>
                write!(f, "forbidden"),
            ApiError::NotFound =>
                write!(f, "not found"),
            ApiError::ListingFailure =>
                write!(f, "failed to read directory"),
            ApiError::Internal =>
                write!(f, "internal error"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

impl From<ContentMismatch> for ApiError {
    fn from(err: ContentMismatch) -> Self {
        ApiError::ContentMismatch(err.sniffed)
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(_: MultipartRejection) -> Self {
        ApiError::RequestTooLarge
    }
}
