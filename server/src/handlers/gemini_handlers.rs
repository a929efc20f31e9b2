use std::collections::BTreeMap;

use analysis_service_cli::{
    AnalysisRequest, JobId, JobRecord, JobStatus, DEFAULT_ANALYSIS_DEPTH, DEFAULT_BRANCH,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzePayload {
    pub repository_url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub focus_areas: Option<Vec<String>>,
    #[serde(default = "default_depth")]
    pub depth: u32,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_depth() -> u32 {
    DEFAULT_ANALYSIS_DEPTH
}

impl From<AnalyzePayload> for AnalysisRequest {
    fn from(payload: AnalyzePayload) -> Self {
        AnalysisRequest {
            repository_url: payload.repository_url,
            branch: payload.branch,
            focus_areas: payload.focus_areas,
            depth: payload.depth,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisStarted {
    pub analysis_id: JobId,
    pub status: JobStatus,
    pub repository_url: String,
    pub findings: BTreeMap<String, String>,
    pub recommendations: Vec<String>,
    pub generated_code: Vec<Value>,
}

impl From<JobRecord> for AnalysisStarted {
    fn from(record: JobRecord) -> Self {
        AnalysisStarted {
            analysis_id: record.id,
            status: record.status,
            repository_url: record.repository_url,
            findings: record.findings,
            recommendations: record.recommendations,
            generated_code: record.generated_code,
        }
    }
}

/// POST /api/gemini/analyze
pub async fn start_analysis(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzePayload>, JsonRejection>,
) -> Result<Json<AnalysisStarted>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let record = state.launcher.start(payload.into())?;
    Ok(Json(record.into()))
}

/// GET /api/gemini/analyze/{analysis_id}
pub async fn poll_analysis(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    // Anything that is not one of our ids was never issued.
    let id = Uuid::parse_str(&analysis_id).map_err(|_| ApiError::NotFound)?;
    state.jobs().get(&id).map(Json).ok_or(ApiError::NotFound)
}
