use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::config::MAX_FILE_SIZE;
use crate::handlers::analysis_handlers::{health, upload_repo};

pub fn analysis_routes() -> Router {
    Router::new()
        .route(
            "/upload-repo",
            post(upload_repo).layer(DefaultBodyLimit::max(MAX_FILE_SIZE)),
        )
        .route("/health", get(health))
}
