use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use super::error::{internal_error, ErrorResponse};
use crate::store::RouteStore;

#[derive(Clone)]
pub struct HealthState {
    pub store: RouteStore,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Whether the service is running
    pub healthy: bool,
    /// Total stored route rows
    pub route_rows: i64,
    /// Distinct trains with stored routes
    pub trains: i64,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse),
        (status = 500, description = "Store unreachable", body = ErrorResponse)
    ),
    tag = "health"
)]
pub async fn health_check(
    State(state): State<HealthState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (route_rows, trains) = state.store.stats().await.map_err(|e| {
        warn!(error = %e, "Failed to read store stats for health check");
        internal_error()
    })?;

    Ok(Json(HealthResponse {
        healthy: true,
        route_rows,
        trains,
    }))
}

pub fn router(store: RouteStore) -> Router {
    let state = HealthState { store };
    Router::new()
        .route("/", get(health_check))
        .with_state(state)
}
