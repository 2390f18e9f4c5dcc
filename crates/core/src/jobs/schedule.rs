//! Recurring job triggers.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler, JobSchedulerError};
use tracing::{debug, info};

use super::config::JobsConfig;
use super::types::Job;

/// Receives the jobs fired by the scheduler.
#[async_trait]
pub(super) trait Trigger: Send + Sync + 'static {
    async fn fire(&self, job: Job);
}

/// Cron expression and the job it fires.
pub(super) fn cron_triggers(config: &JobsConfig) -> Vec<(&str, Job)> {
    vec![
        (config.refresh_torrents_cron.as_str(), Job::RefreshTorrents),
        (config.scan_library_cron.as_str(), Job::ScanLibrary),
        (config.find_new_episodes_cron.as_str(), Job::FindNewEpisodes),
        (config.download_missing_cron.as_str(), Job::DownloadMissing),
    ]
}

/// Builds and starts the scheduler.
pub(super) async fn start_scheduler(
    config: &JobsConfig,
    target: Arc<dyn Trigger>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    for (cron, job) in cron_triggers(config) {
        let target = Arc::clone(&target);
        let cron_job = CronJob::new_async(cron, move |_uuid, _l| {
            let target = Arc::clone(&target);
            Box::pin(async move {
                debug!(job = job.name(), "Cron trigger fired");
                target.fire(job).await;
            })
        })?;
        scheduler.add(cron_job).await?;
        debug!(job = job.name(), cron, "Scheduled recurring job");
    }

    scheduler.start().await?;

    info!("Job scheduler started");
    Ok(scheduler)
}
