use std::sync::Arc;

use analysis_service_cli::launcher::JobLauncher;
use analysis_service_cli::store::JobStore;

// Shared by every handler: the launcher owns the job store.
#[derive(Clone)]
pub struct AppState {
    pub launcher: Arc<JobLauncher>,
}

impl AppState {
    pub fn new(launcher: JobLauncher) -> Self {
        AppState {
            launcher: Arc::new(launcher),
        }
    }

    pub fn jobs(&self) -> &JobStore {
        self.launcher.store()
    }
}
