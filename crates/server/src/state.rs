use std::sync::Arc;
use reelkeeper_core::{Config, JobOrchestrator, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    /// None when no torrent client is configured.
    jobs: Option<Arc<JobOrchestrator>>,
}

impl AppState {
    pub fn new(config: Config, jobs: Option<Arc<JobOrchestrator>>) -> Self {
        Self { config, jobs }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn jobs(&self) -> Option<&Arc<JobOrchestrator>> {
        self.jobs.as_ref()
    }
}
