mod app;
mod config;
mod errors;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use analysis_service_cli::ai::GeminiClient;
use analysis_service_cli::launcher::JobLauncher;
use analysis_service_cli::store::JobStore;
use analysis_service_cli::telemetry::{self, LogFormat};
use tokio::net::TcpListener;
use tracing::info;

use config::Config;
use state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init(LogFormat::Json);

    let config = Config::from_env()?;
    let generator = Arc::new(GeminiClient::new(config.gemini.clone())?);

    let store = JobStore::new(config.store_limits.clone());
    let _sweeper = store.spawn_sweeper(SWEEP_INTERVAL);
    let launcher = JobLauncher::new(store, generator).with_max_depth(config.max_analysis_depth);

    let app = app::build_app(AppState::new(launcher), &config.allowed_origins);

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(
        addr = %listener.local_addr()?,
        model = %config.gemini.model,
        origins = ?config.allowed_origins,
        frontend = %config.frontend_url,
        "listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
