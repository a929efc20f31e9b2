use axum::routing::{get, post};
use axum::Router;

use crate::handlers::gemini_handlers::{poll_analysis, start_analysis};
use crate::state::AppState;

pub fn gemini_routes(state: AppState) -> Router {
    Router::new()
        .route("/analyze", post(start_analysis))
        .route("/analyze/{analysis_id}", get(poll_analysis))
        .with_state(state)
}
