pub mod error;
pub mod health;
pub mod upload;

pub use error::{internal_error, ErrorResponse};

use axum::Router;

use crate::store::RouteStore;

pub fn router(store: RouteStore, max_csv_bytes: usize) -> Router {
    Router::new()
        .nest("/routes", upload::router(store.clone(), max_csv_bytes))
        .nest("/health", health::router(store))
}
