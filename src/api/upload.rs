use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::api::error::{upload_error_response, ErrorResponse};
use crate::ingest::{self, SkippedRow};
use crate::store::RouteStore;

#[derive(Clone)]
pub struct UploadState {
    pub store: RouteStore,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub ok: bool,
    /// Route rows written to the store.
    pub inserted: u64,
    /// Distinct trains whose routes were replaced or created.
    pub trains_affected: usize,
    /// Rows dropped during parsing/normalization, with line numbers.
    pub skipped: Vec<SkippedRow>,
}

/// Upload a train-route CSV and replace the stored routes of every train
/// it references.
#[utoipa::path(
    post,
    path = "/api/routes/upload",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload reconciled against the store", body = UploadResponse),
        (status = 400, description = "No file, empty CSV, or no usable rows", body = ErrorResponse),
        (status = 500, description = "Store operation failed", body = ErrorResponse)
    ),
    tag = "routes"
)]
pub async fn upload_routes(
    State(state): State<UploadState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<ErrorResponse>)> {
    let csv_text = read_csv_field(&mut multipart).await.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("no file supplied")),
        )
    })?;

    let summary = ingest::process_upload(&state.store, &csv_text)
        .await
        .map_err(|e| {
            warn!(error = %e, "Route upload failed");
            upload_error_response(&e)
        })?;

    Ok(Json(UploadResponse {
        ok: true,
        inserted: summary.inserted,
        trains_affected: summary.trains_affected,
        skipped: summary.skipped,
    }))
}

/// Pull the CSV text out of the multipart body: the first field carrying a
/// filename, or one named "file". Non-UTF-8 content is ingested lossily
/// rather than rejected.
async fn read_csv_field(multipart: &mut Multipart) -> Option<String> {
    while let Some(field) = multipart.next_field().await.ok()? {
        if field.file_name().is_some() || field.name() == Some("file") {
            let bytes = field.bytes().await.ok()?;
            return Some(String::from_utf8_lossy(&bytes).into_owned());
        }
    }
    None
}

pub fn router(store: RouteStore, max_csv_bytes: usize) -> Router {
    let state = UploadState { store };
    Router::new()
        .route("/upload", post(upload_routes))
        .layer(DefaultBodyLimit::max(max_csv_bytes))
        .with_state(state)
}
