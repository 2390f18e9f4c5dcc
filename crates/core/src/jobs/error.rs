//! Job errors.

use thiserror::Error;

use crate::media::StrategyError;
use crate::organizer::OrganizeError;
use crate::store::StoreError;
use crate::torrent_client::TorrentClientError;

use super::collaborators::CollaboratorError;
use super::types::JobQueue;

/// Errors raised while enqueueing or running a job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("organize failed: {0}")]
    Organize(#[from] OrganizeError),

    #[error("invalid organize strategy: {0}")]
    Strategy(#[from] StrategyError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("torrent client error: {0}")]
    TorrentClient(#[from] TorrentClientError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// The collaborator the job needs was not wired in.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// The worker for the queue has shut down.
    #[error("queue {0} is closed")]
    QueueClosed(JobQueue),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
}

impl JobError {
    /// Whether the job should be re-enqueued after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            JobError::Organize(e) => e.is_retryable(),
            JobError::Store(e) => e.is_retryable(),
            JobError::TorrentClient(e) => e.is_retryable(),
            JobError::Collaborator(e) => e.is_retryable(),
            JobError::Strategy(_)
            | JobError::NotConfigured(_)
            | JobError::QueueClosed(_)
            | JobError::Scheduler(_) => false,
        }
    }
}
