use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::ai::TextGenerator;
use crate::orchestrator::Orchestrator;
use crate::store::{JobStore, StoreError};
use crate::{AnalysisRequest, JobRecord, JobStatus, MAX_ANALYSIS_DEPTH};

pub const PANICKED_MESSAGE: &str = "analysis task panicked";

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("repository_url must not be empty")]
    EmptyRepositoryUrl,

    #[error("depth must be between 1 and {max}, got {depth}")]
    InvalidDepth { depth: u32, max: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Default)]
struct TaskStats {
    launched: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
}

impl TaskStats {
    fn snapshot(&self) -> TaskCounts {
        TaskCounts {
            launched: self.launched.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

/// Outcome counters of every analysis task started by a launcher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub launched: u64,
    pub completed: u64,
    pub failed: u64,
    pub panicked: u64,
}

impl TaskCounts {
    pub fn running(&self) -> u64 {
        self.launched
            .saturating_sub(self.completed + self.failed + self.panicked)
    }
}

/// Creates analyses and runs them in the background.
pub struct JobLauncher {
    store: JobStore,
    orchestrator: Arc<Orchestrator>,
    max_depth: u32,
    stats: Arc<TaskStats>,
}

impl JobLauncher {
    pub fn new(store: JobStore, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            orchestrator: Arc::new(Orchestrator::new(store.clone(), generator)),
            store,
            max_depth: MAX_ANALYSIS_DEPTH,
            stats: Arc::default(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn counts(&self) -> TaskCounts {
        self.stats.snapshot()
    }

    /// Stores a fresh `analyzing` record and spawns its orchestrator.
    ///
    /// Returns the record as it was at creation; the caller never waits on
    /// any iteration. Must be called from inside a tokio runtime.
    pub fn start(&self, request: AnalysisRequest) -> Result<JobRecord, LaunchError> {
        let record = self.create(&request)?;
        let id = record.id;
        info!(
            %id,
            repository = %request.repository_url,
            depth = request.depth,
            "analysis launched"
        );

        let orchestrator = Arc::clone(&self.orchestrator);
        let store = self.store.clone();
        let stats = Arc::clone(&self.stats);
        stats.launched.fetch_add(1, Ordering::Relaxed);

        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(orchestrator.run(id, &request))
                .catch_unwind()
                .await;
            match outcome {
                Ok(JobStatus::Completed) => {
                    stats.completed.fetch_add(1, Ordering::Relaxed);
                }
                Ok(_) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                }
                Err(_) => {
                    error!(%id, "analysis task panicked");
                    stats.panicked.fetch_add(1, Ordering::Relaxed);
                    store.update(&id, |r| r.fail(PANICKED_MESSAGE));
                }
            }

            let totals = stats.snapshot();
            info!(
                %id,
                launched = totals.launched,
                completed = totals.completed,
                failed = totals.failed,
                panicked = totals.panicked,
                running = totals.running(),
                "analysis task finished"
            );
        });

        Ok(record)
    }

    /// Like [`JobLauncher::start`] but runs the analysis on the current task
    /// and returns the final record.
    pub async fn run_to_completion(
        &self,
        request: AnalysisRequest,
    ) -> Result<JobRecord, LaunchError> {
        let record = self.create(&request)?;
        self.orchestrator.run(record.id, &request).await;
        Ok(self.store.get(&record.id).unwrap_or(record))
    }

    fn create(&self, request: &AnalysisRequest) -> Result<JobRecord, LaunchError> {
        if request.repository_url.trim().is_empty() {
            return Err(LaunchError::EmptyRepositoryUrl);
        }
        if request.depth == 0 || request.depth > self.max_depth {
            return Err(LaunchError::InvalidDepth {
                depth: request.depth,
                max: self.max_depth,
            });
        }

        let record = JobRecord::new(Uuid::new_v4(), request);
        self.store.insert(record.clone())?;
        Ok(record)
    }
}
