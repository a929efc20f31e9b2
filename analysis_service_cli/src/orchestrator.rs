use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::ai::{AdapterError, TextGenerator};
use crate::extract::extract_recommendations;
use crate::prompts::{iteration_key, primary_prompt, refinement_key, REFINEMENT_PROMPT};
use crate::store::JobStore;
use crate::{AnalysisRequest, JobId, JobRecord, JobStatus};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("analysis {0} is no longer tracked")]
    RecordMissing(JobId),
}

/// Drives the iteration loop of one analysis and writes its progress into the store.
pub struct Orchestrator {
    store: JobStore,
    generator: Arc<dyn TextGenerator>,
}

impl Orchestrator {
    pub fn new(store: JobStore, generator: Arc<dyn TextGenerator>) -> Self {
        Self { store, generator }
    }

    /// Runs every iteration of `id` and leaves the record `completed` or `failed`.
    ///
    /// Errors never escape: the first failing call ends the loop, the message
    /// goes into the record, and findings gathered so far stay in place.
    #[instrument(
        skip(self, request),
        fields(repository = %request.repository_url, depth = request.depth)
    )]
    pub async fn run(&self, id: JobId, request: &AnalysisRequest) -> JobStatus {
        match self.iterate(id, request).await {
            Ok(()) => {
                self.store.update(&id, JobRecord::complete);
                info!("analysis completed");
                JobStatus::Completed
            }
            Err(err) => {
                error!(error = %err, "analysis failed");
                self.store.update(&id, |r| r.fail(err.to_string()));
                JobStatus::Failed
            }
        }
    }

    async fn iterate(&self, id: JobId, request: &AnalysisRequest) -> Result<(), OrchestratorError> {
        let focus_areas = request.effective_focus_areas();

        for iteration in 1..=request.depth {
            self.mutate(id, |r| r.begin_iteration(iteration))?;

            let prompt = primary_prompt(
                &request.repository_url,
                &focus_areas,
                iteration,
                request.depth,
            );
            let key = iteration_key(iteration);
            let text = self.call(&key, &prompt).await?;
            let recommendations = extract_recommendations(&text);
            debug!(%key, recommendations = recommendations.len(), "recorded finding");
            self.mutate(id, |r| r.record_finding(key, text, recommendations))?;

            if iteration < request.depth {
                let key = refinement_key(iteration);
                let text = self.call(&key, REFINEMENT_PROMPT).await?;
                self.mutate(id, |r| r.record_finding(key, text, Vec::new()))?;
            }
        }
        Ok(())
    }

    async fn call(&self, key: &str, prompt: &str) -> Result<String, AdapterError> {
        debug!(%key, "calling generator");
        let text = self.generator.generate(prompt).await?;
        debug!(%key, bytes = text.len(), "generator answered");
        Ok(text)
    }

    fn mutate<F>(&self, id: JobId, f: F) -> Result<(), OrchestratorError>
    where
        F: FnOnce(&mut JobRecord),
    {
        self.store
            .update(&id, f)
            .ok_or(OrchestratorError::RecordMissing(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedGenerator;
    use uuid::Uuid;

    type Fixture = (
        Orchestrator,
        Arc<ScriptedGenerator>,
        JobStore,
        JobId,
        AnalysisRequest,
    );

    fn setup(generator: ScriptedGenerator, depth: u32) -> Fixture {
        let store = JobStore::default();
        let generator = Arc::new(generator);
        let request = AnalysisRequest::new("https://github.com/acme/app", depth);
        let id = Uuid::new_v4();
        store.insert(JobRecord::new(id, &request)).unwrap();
        let orchestrator = Orchestrator::new(store.clone(), generator.clone());
        (orchestrator, generator, store, id, request)
    }

    fn keys(record: &JobRecord) -> Vec<&str> {
        record.findings.keys().map(String::as_str).collect()
    }

    #[tokio::test]
    async fn single_iteration_skips_refinement() {
        let (orchestrator, generator, store, id, request) = setup(ScriptedGenerator::new(), 1);

        assert_eq!(orchestrator.run(id, &request).await, JobStatus::Completed);

        let record = store.get(&id).unwrap();
        assert_eq!(generator.calls(), 1);
        assert_eq!(keys(&record), vec!["iteration_1"]);
        assert_eq!(record.current_iteration, 1);
        assert_eq!(record.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn full_run_records_every_finding() {
        let (orchestrator, generator, store, id, request) = setup(ScriptedGenerator::new(), 3);

        assert_eq!(orchestrator.run(id, &request).await, JobStatus::Completed);

        let record = store.get(&id).unwrap();
        assert_eq!(generator.calls(), 5);
        assert_eq!(
            keys(&record),
            vec!["iteration_1", "iteration_2", "iteration_3", "refinement_1", "refinement_2"]
        );
        assert_eq!(record.current_iteration, 3);
        assert!(record.error.is_none());
        // Only primary responses (calls 1, 3 and 5) are mined for recommendations.
        assert_eq!(
            record.recommendations,
            vec![
                "You should add integration tests (call 1)",
                "You should add integration tests (call 3)",
                "You should add integration tests (call 5)",
            ]
        );
    }

    #[tokio::test]
    async fn prompts_alternate_between_primary_and_refinement() {
        let (orchestrator, generator, _store, id, request) = setup(ScriptedGenerator::new(), 2);
        orchestrator.run(id, &request).await;

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("Iteration: 1/2"));
        assert!(prompts[0].contains("Focus areas: architecture, performance, security"));
        assert_eq!(prompts[1], REFINEMENT_PROMPT);
        assert!(prompts[2].contains("Iteration: 2/2"));
    }

    #[tokio::test]
    async fn failure_on_second_primary_call_keeps_partial_results() {
        // Calls: iteration_1, refinement_1, iteration_2 (fails).
        let (orchestrator, generator, store, id, request) =
            setup(ScriptedGenerator::failing_on(3), 3);

        assert_eq!(orchestrator.run(id, &request).await, JobStatus::Failed);

        let record = store.get(&id).unwrap();
        assert_eq!(generator.calls(), 3);
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(keys(&record), vec!["iteration_1", "refinement_1"]);
        assert_eq!(record.current_iteration, 2);
        assert_eq!(record.recommendations.len(), 1);
        let error = record.error.unwrap();
        assert!(error.contains("429"), "unexpected error: {error}");
    }

    #[tokio::test]
    async fn failing_refinement_aborts_the_job() {
        let (orchestrator, _generator, store, id, request) =
            setup(ScriptedGenerator::failing_on(2), 2);

        assert_eq!(orchestrator.run(id, &request).await, JobStatus::Failed);

        let record = store.get(&id).unwrap();
        assert_eq!(keys(&record), vec!["iteration_1"]);
        assert_eq!(record.current_iteration, 1);
    }

    #[tokio::test]
    async fn missing_record_stops_the_loop() {
        let store = JobStore::default();
        let generator = Arc::new(ScriptedGenerator::new());
        let orchestrator = Orchestrator::new(store.clone(), generator.clone());
        let request = AnalysisRequest::new("https://github.com/acme/app", 3);

        assert_eq!(orchestrator.run(Uuid::new_v4(), &request).await, JobStatus::Failed);
        assert_eq!(generator.calls(), 0);
    }
}
