pub mod ai;
pub mod extract;
pub mod launcher;
pub mod orchestrator;
pub mod prompts;
pub mod store;
pub mod telemetry;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on the number of iterations a single analysis may request.
pub const MAX_ANALYSIS_DEPTH: u32 = 5;
pub const DEFAULT_ANALYSIS_DEPTH: u32 = 3;
/// Budget for one upstream call, in seconds.
pub const TIMEOUT_SECONDS: u64 = 300;
pub const DEFAULT_BRANCH: &str = "main";

pub type JobId = Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Reserved; a launched job starts out `Analyzing`.
    Pending,
    Analyzing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// What a caller asks to have analyzed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub repository_url: String,
    pub branch: String,
    pub focus_areas: Option<Vec<String>>,
    pub depth: u32,
}

impl AnalysisRequest {
    pub fn new(repository_url: impl Into<String>, depth: u32) -> Self {
        Self {
            repository_url: repository_url.into(),
            branch: DEFAULT_BRANCH.to_string(),
            focus_areas: None,
            depth,
        }
    }

    pub fn with_focus_areas(mut self, focus_areas: Vec<String>) -> Self {
        self.focus_areas = Some(focus_areas);
        self
    }

    /// Caller-supplied focus areas, or the defaults when none (or an empty list) were given.
    pub fn effective_focus_areas(&self) -> Vec<String> {
        match &self.focus_areas {
            Some(areas) if !areas.is_empty() => areas.clone(),
            _ => prompts::DEFAULT_FOCUS_AREAS
                .iter()
                .map(|area| area.to_string())
                .collect(),
        }
    }
}

/// State of one analysis, as stored in the [`store::JobStore`] and returned to pollers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "analysis_id")]
    pub id: JobId,
    pub status: JobStatus,
    pub repository_url: String,
    pub branch: String,
    pub focus_areas: Option<Vec<String>>,
    pub findings: BTreeMap<String, String>,
    pub recommendations: Vec<String>,
    /// Reserved, never populated.
    pub generated_code: Vec<serde_json::Value>,
    #[serde(rename = "iteration")]
    pub current_iteration: u32,
    pub max_iterations: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(id: JobId, request: &AnalysisRequest) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Analyzing,
            repository_url: request.repository_url.clone(),
            branch: request.branch.clone(),
            focus_areas: request.focus_areas.clone(),
            findings: BTreeMap::new(),
            recommendations: Vec::new(),
            generated_code: Vec::new(),
            current_iteration: 0,
            max_iterations: request.depth,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the iteration counter forward. Never goes backwards, never past `max_iterations`,
    /// and does nothing once the job is terminal.
    pub fn begin_iteration(&mut self, iteration: u32) {
        if self.status.is_terminal() || iteration <= self.current_iteration {
            return;
        }
        self.current_iteration = iteration.min(self.max_iterations);
        self.touch();
    }

    /// Stores a finding together with the recommendations extracted from it.
    /// Existing keys are left untouched.
    pub fn record_finding(
        &mut self,
        key: impl Into<String>,
        text: impl Into<String>,
        recommendations: Vec<String>,
    ) {
        if self.status.is_terminal() {
            return;
        }
        let key = key.into();
        if self.findings.contains_key(&key) {
            return;
        }
        self.findings.insert(key, text.into());
        self.recommendations.extend(recommendations);
        self.touch();
    }

    pub fn complete(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = JobStatus::Completed;
        self.touch();
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
