//! Mock placer for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::placer::{
    FileOutcome, FileReport, PlacementJob, PlacementReport, Placer, PlacerError,
};

/// Mock implementation of the Placer trait.
///
/// Touches no files. Every requested file is reported as placed at
/// `target_dir/file_name` unless a failure is configured.
///
/// # Example
///
/// ```rust,ignore
/// use reelkeeper_core::testing::MockPlacer;
///
/// let placer = MockPlacer::new();
/// placer.fail_at(1).await; // second file fails, the rest are skipped
///
/// let report = placer.place(job).await?;
/// assert_eq!(placer.placement_count().await, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockPlacer {
    /// Recorded placement jobs.
    placements: Arc<RwLock<Vec<PlacementJob>>>,
    /// Index of the file that fails in every job.
    fail_at: Arc<RwLock<Option<usize>>>,
    /// If set, the next job will fail outright with this error.
    next_error: Arc<RwLock<Option<PlacerError>>>,
}

impl MockPlacer {
    /// Create a new mock placer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded placement jobs.
    pub async fn recorded_placements(&self) -> Vec<PlacementJob> {
        self.placements.read().await.clone()
    }

    /// Number of placement jobs received.
    pub async fn placement_count(&self) -> usize {
        self.placements.read().await.len()
    }

    /// Fail the file at `index` of every following job.
    pub async fn fail_at(&self, index: usize) {
        *self.fail_at.write().await = Some(index);
    }

    /// Make the next job fail with the given error.
    pub async fn set_next_error(&self, error: PlacerError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl Placer for MockPlacer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn place(&self, job: PlacementJob) -> Result<PlacementReport, PlacerError> {
        self.placements.write().await.push(job.clone());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let fail_at = *self.fail_at.read().await;
        let files = job
            .files
            .iter()
            .enumerate()
            .map(|(index, placement)| {
                let outcome = match fail_at {
                    Some(failed) if index == failed => FileOutcome::Failed {
                        error: "mock placement failure".to_string(),
                    },
                    Some(failed) if index > failed => FileOutcome::Skipped,
                    _ => FileOutcome::Placed {
                        destination: job.target_dir.join(&placement.file_name),
                        size_bytes: 0,
                    },
                };
                FileReport {
                    item_id: placement.item_id.clone(),
                    source: placement.source.clone(),
                    outcome,
                }
            })
            .collect();

        Ok(PlacementReport {
            job_id: job.job_id,
            strategy: job.strategy,
            files,
            duration_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::OrganizeStrategy;
    use crate::placer::FilePlacement;
    use std::path::PathBuf;

    fn job(count: usize) -> PlacementJob {
        PlacementJob {
            job_id: "job".to_string(),
            target_dir: PathBuf::from("/library/Foo"),
            strategy: OrganizeStrategy::Copy,
            files: (0..count)
                .map(|i| FilePlacement {
                    item_id: format!("item-{}", i),
                    source: PathBuf::from(format!("/downloads/{}.mkv", i)),
                    file_name: format!("{}.mkv", i),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_places_everything_by_default() {
        let placer = MockPlacer::new();
        let report = placer.place(job(2)).await.unwrap();

        assert!(report.is_success());
        let placed: Vec<_> = report.placed().map(|(_, dest)| dest.clone()).collect();
        assert_eq!(placed[1], PathBuf::from("/library/Foo/1.mkv"));
        assert_eq!(placer.placement_count().await, 1);
    }

    #[tokio::test]
    async fn test_fail_at_skips_rest() {
        let placer = MockPlacer::new();
        placer.fail_at(1).await;
        let report = placer.place(job(3)).await.unwrap();

        assert_eq!(report.placed_count(), 1);
        assert!(matches!(report.files[1].outcome, FileOutcome::Failed { .. }));
        assert_eq!(report.files[2].outcome, FileOutcome::Skipped);
    }
}
