use axum::{http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::ingest::UploadError;
use crate::store::StoreError;

/// Error body returned by every failing endpoint, so the HTTP response is
/// always well-formed JSON.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: code.into(),
        }
    }
}

/// Generic 500 for anything not explicitly classified.
pub fn internal_error() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("server error")),
    )
}

/// Map a failed upload to its HTTP status and stable error code.
/// Input problems are the caller's fault (400); store failures are 500.
pub fn upload_error_response(error: &UploadError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match error {
        UploadError::EmptyCsv => (StatusCode::BAD_REQUEST, "empty CSV"),
        UploadError::NoParseableRows => (StatusCode::BAD_REQUEST, "no parseable rows"),
        UploadError::NothingToInsert => (StatusCode::BAD_REQUEST, "nothing to insert"),
        UploadError::Store(StoreError::Lookup(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "lookup failed")
        }
        UploadError::Store(StoreError::MaxId(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "max-identifier lookup failed",
        ),
        UploadError::Store(StoreError::Delete(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "delete failed")
        }
        UploadError::Store(StoreError::Insert(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "insert failed")
        }
    };

    (status, Json(ErrorResponse::new(code)))
}
