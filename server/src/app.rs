use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::handlers::analysis_handlers::service_health;
use crate::routes::{analysis::analysis_routes, gemini::gemini_routes};
use crate::state::AppState;

/// Full router: health probe, analysis and upload routes, CORS for `allowed_origins`.
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(service_health))
        .nest("/api/gemini", gemini_routes(state))
        .nest("/api/analysis", analysis_routes())
        .layer(cors(allowed_origins))
}

fn cors(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
