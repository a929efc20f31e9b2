use std::env;
use std::sync::Arc;

use analysis_service_cli::ai::{GeminiClient, GeminiConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
use analysis_service_cli::launcher::JobLauncher;
use analysis_service_cli::store::JobStore;
use analysis_service_cli::telemetry::{self, LogFormat};
use analysis_service_cli::{
    utils, AnalysisRequest, JobStatus, DEFAULT_ANALYSIS_DEPTH, DEFAULT_BRANCH,
};
use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Repository to analyze
    #[arg(short, long)]
    repository_url: String,

    /// Branch recorded with the analysis
    #[arg(short, long, default_value = DEFAULT_BRANCH)]
    branch: String,

    /// Focus area; repeat for several (defaults to architecture, performance, security)
    #[arg(short, long = "focus")]
    focus: Vec<String>,

    /// Number of analysis iterations
    #[arg(short, long, default_value_t = DEFAULT_ANALYSIS_DEPTH)]
    depth: u32,

    /// Where to write the final analysis record
    #[arg(short, long, default_value = "analysis.json")]
    output: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    telemetry::init(LogFormat::Pretty);
    let args = Args::parse();

    let api_key =
        env::var("GEMINI_API_KEY").map_err(|_| "GEMINI_API_KEY environment variable not set")?;
    let config = GeminiConfig::new(api_key)
        .with_model(env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()))
        .with_base_url(
            env::var("GEMINI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        );
    let launcher = JobLauncher::new(JobStore::default(), Arc::new(GeminiClient::new(config)?));

    let mut request = AnalysisRequest::new(args.repository_url, args.depth);
    request.branch = args.branch;
    if !args.focus.is_empty() {
        request = request.with_focus_areas(args.focus);
    }

    let record = launcher.run_to_completion(request).await?;
    utils::save_json(&record, &args.output)?;

    if record.status == JobStatus::Failed {
        let reason = record.error.unwrap_or_default();
        error!(%reason, "analysis failed");
        return Err(format!("analysis failed: {reason}").into());
    }
    info!(
        findings = record.findings.len(),
        recommendations = record.recommendations.len(),
        "analysis completed"
    );
    Ok(())
}
