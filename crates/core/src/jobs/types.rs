//! Job payloads, queues and lifecycle records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::media::{MediaRef, OrganizeStrategy};

/// Named queue. Each queue is drained by a single worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobQueue {
    Download,
    Organize,
    RefreshTorrents,
    ScanLibrary,
}

impl JobQueue {
    pub const ALL: [JobQueue; 4] = [
        JobQueue::Download,
        JobQueue::Organize,
        JobQueue::RefreshTorrents,
        JobQueue::ScanLibrary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobQueue::Download => "download",
            JobQueue::Organize => "organize",
            JobQueue::RefreshTorrents => "refresh_torrents",
            JobQueue::ScanLibrary => "scan_library",
        }
    }
}

impl fmt::Display for JobQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work carried by a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    DownloadMovie { movie_id: i64 },
    DownloadSeason { season_id: i64 },
    DownloadEpisode { episode_id: i64 },
    DownloadMissing,
    /// The strategy is fixed when the job is enqueued.
    Organize {
        media: MediaRef,
        strategy: OrganizeStrategy,
    },
    RefreshTorrents,
    ScanLibrary,
    FindNewEpisodes,
}

impl Job {
    pub fn queue(&self) -> JobQueue {
        match self {
            Job::DownloadMovie { .. }
            | Job::DownloadSeason { .. }
            | Job::DownloadEpisode { .. }
            | Job::DownloadMissing => JobQueue::Download,
            Job::Organize { .. } => JobQueue::Organize,
            Job::RefreshTorrents => JobQueue::RefreshTorrents,
            Job::ScanLibrary | Job::FindNewEpisodes => JobQueue::ScanLibrary,
        }
    }

    /// Job name used in logs and API responses.
    pub fn name(&self) -> &'static str {
        match self {
            Job::DownloadMovie { .. } => "download-movie",
            Job::DownloadSeason { .. } => "download-season",
            Job::DownloadEpisode { .. } => "download-episode",
            Job::DownloadMissing => "download-missing",
            Job::Organize { .. } => "organize-library",
            Job::RefreshTorrents => "refresh-torrents",
            Job::ScanLibrary => "scan-library",
            Job::FindNewEpisodes => "find-new-episodes",
        }
    }
}

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting on its queue, possibly for a retry.
    Enqueued,
    Active,
    Completed,
    /// Out of attempts or not retryable.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Enqueued => "enqueued",
            JobStatus::Active => "active",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Whether the job will not run again.
    pub fn is_final(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Returned by every enqueue operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub id: Uuid,
    pub queue: JobQueue,
    pub name: String,
}

/// Registry entry for a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub queue: JobQueue,
    pub name: String,
    pub job: Job,
    pub status: JobStatus,
    /// Runs started so far.
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(job: Job) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            queue: job.queue(),
            name: job.name().to_string(),
            job,
            status: JobStatus::Enqueued,
            attempts: 0,
            last_error: None,
            enqueued_at: now,
            updated_at: now,
        }
    }

    pub fn handle(&self) -> JobHandle {
        JobHandle {
            id: self.id,
            queue: self.queue,
            name: self.name.clone(),
        }
    }
}

/// Job counts per lifecycle status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsStatus {
    /// Whether the queue workers are running.
    pub running: bool,
    pub enqueued: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_queues() {
        assert_eq!(Job::DownloadMissing.queue(), JobQueue::Download);
        assert_eq!(Job::FindNewEpisodes.queue(), JobQueue::ScanLibrary);
        assert_eq!(
            Job::Organize {
                media: MediaRef::Movie(1),
                strategy: OrganizeStrategy::Link,
            }
            .queue(),
            JobQueue::Organize
        );
    }

    #[test]
    fn test_new_record_is_enqueued() {
        let record = JobRecord::new(Job::DownloadMovie { movie_id: 3 });
        assert_eq!(record.status, JobStatus::Enqueued);
        assert_eq!(record.attempts, 0);
        assert_eq!(record.name, "download-movie");

        let handle = record.handle();
        assert_eq!(handle.id, record.id);
        assert_eq!(handle.queue, JobQueue::Download);
    }

    #[test]
    fn test_job_serialization() {
        let job = Job::Organize {
            media: MediaRef::Season(4),
            strategy: OrganizeStrategy::Move,
        };
        let json = serde_json::to_value(job).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "organize",
                "media": { "kind": "season", "id": 4 },
                "strategy": "move"
            })
        );
    }

    #[test]
    fn test_final_statuses() {
        assert!(JobStatus::Completed.is_final());
        assert!(JobStatus::Failed.is_final());
        assert!(!JobStatus::Enqueued.is_final());
        assert!(!JobStatus::Active.is_final());
    }
}
