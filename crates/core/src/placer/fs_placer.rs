//! File system placer implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::media::OrganizeStrategy;

use super::error::PlacerError;
use super::traits::Placer;
use super::types::{FileOutcome, FilePlacement, FileReport, PlacementJob, PlacementReport};

/// File system based placer implementation.
#[derive(Debug, Default, Clone)]
pub struct FsPlacer;

impl FsPlacer {
    pub fn new() -> Self {
        Self
    }

    /// Attempts to move a file atomically (rename).
    async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
        match fs::rename(source, destination).await {
            Ok(()) => Ok(true),
            Err(e) => {
                // Cross-filesystem moves fail with EXDEV (18 on Linux)
                if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Copies a file or a whole directory tree. Returns the bytes copied.
    async fn copy_recursive(source: &Path, destination: &Path) -> Result<u64, PlacerError> {
        let source = source.to_path_buf();
        let destination = destination.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let copy_err = |e: std::io::Error| {
                PlacerError::copy_failed(source.clone(), destination.clone(), e)
            };

            if source.is_file() {
                return std::fs::copy(&source, &destination).map_err(copy_err);
            }

            let mut total = 0u64;
            for entry in WalkDir::new(&source) {
                let entry = entry.map_err(|e| copy_err(e.into()))?;
                let relative = entry
                    .path()
                    .strip_prefix(&source)
                    .map_err(|e| copy_err(std::io::Error::other(e)))?;
                let target = destination.join(relative);

                if entry.file_type().is_dir() {
                    std::fs::create_dir_all(&target).map_err(copy_err)?;
                } else {
                    total += std::fs::copy(entry.path(), &target).map_err(copy_err)?;
                }
            }
            Ok(total)
        })
        .await
        .map_err(|e| PlacerError::Io(std::io::Error::other(e)))?
    }

    /// Removes whatever is at `path` without following symlinks.
    async fn clear_destination(path: &Path) -> Result<(), std::io::Error> {
        match fs::symlink_metadata(path).await {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).await,
            Ok(_) => fs::remove_file(path).await,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn remove_source(path: &Path) -> Result<(), std::io::Error> {
        if fs::metadata(path).await?.is_dir() {
            fs::remove_dir_all(path).await
        } else {
            fs::remove_file(path).await
        }
    }

    #[cfg(unix)]
    async fn symlink(source: &Path, destination: &Path) -> Result<(), std::io::Error> {
        fs::symlink(source, destination).await
    }

    #[cfg(windows)]
    async fn symlink(source: &Path, destination: &Path) -> Result<(), std::io::Error> {
        if source.is_dir() {
            fs::symlink_dir(source, destination).await
        } else {
            fs::symlink_file(source, destination).await
        }
    }

    /// Places a single file. Returns the destination and its size.
    async fn place_file(
        placement: &FilePlacement,
        target_dir: &Path,
        strategy: OrganizeStrategy,
    ) -> Result<(PathBuf, u64), PlacerError> {
        let source = &placement.source;
        let destination = target_dir.join(&placement.file_name);

        let meta = fs::metadata(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlacerError::SourceNotFound {
                    path: source.clone(),
                }
            } else {
                PlacerError::Io(e)
            }
        })?;

        Self::clear_destination(&destination).await?;

        let size_bytes = match strategy {
            OrganizeStrategy::Link => {
                // Link targets resolve against the link's directory, not the cwd
                let link_err =
                    |e| PlacerError::link_failed(source.clone(), destination.clone(), e);
                let target = std::path::absolute(source).map_err(link_err)?;
                Self::symlink(&target, &destination)
                    .await
                    .map_err(link_err)?;
                meta.len()
            }
            OrganizeStrategy::Move => {
                let moved = Self::try_atomic_move(source, &destination)
                    .await
                    .map_err(|e| {
                        PlacerError::move_failed(source.clone(), destination.clone(), e)
                    })?;
                if moved {
                    meta.len()
                } else {
                    debug!(source = %source.display(), "Cross-device move, copying");
                    let size = Self::copy_recursive(source, &destination).await?;
                    Self::remove_source(source).await.map_err(|e| {
                        PlacerError::move_failed(source.clone(), destination.clone(), e)
                    })?;
                    size
                }
            }
            OrganizeStrategy::Copy => Self::copy_recursive(source, &destination).await?,
        };

        Ok((destination, size_bytes))
    }
}

#[async_trait]
impl Placer for FsPlacer {
    fn name(&self) -> &str {
        "fs"
    }

    async fn place(&self, job: PlacementJob) -> Result<PlacementReport, PlacerError> {
        let start = Instant::now();

        fs::create_dir_all(&job.target_dir)
            .await
            .map_err(|e| PlacerError::DirectoryCreationFailed {
                path: job.target_dir.clone(),
                source: e,
            })?;

        let mut files = Vec::with_capacity(job.files.len());
        let mut failed = false;

        for placement in &job.files {
            let outcome = if failed {
                FileOutcome::Skipped
            } else {
                match Self::place_file(placement, &job.target_dir, job.strategy).await {
                    Ok((destination, size_bytes)) => {
                        debug!(
                            job_id = %job.job_id,
                            destination = %destination.display(),
                            strategy = %job.strategy,
                            "Placed file"
                        );
                        FileOutcome::Placed {
                            destination,
                            size_bytes,
                        }
                    }
                    Err(e) => {
                        warn!(
                            job_id = %job.job_id,
                            source = %placement.source.display(),
                            error = %e,
                            "Placement failed, skipping remaining files"
                        );
                        failed = true;
                        FileOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                }
            };

            files.push(FileReport {
                item_id: placement.item_id.clone(),
                source: placement.source.clone(),
                outcome,
            });
        }

        let report = PlacementReport {
            job_id: job.job_id,
            strategy: job.strategy,
            files,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            job_id = %report.job_id,
            placed = report.placed_count(),
            requested = report.files.len(),
            bytes = report.total_bytes(),
            "Placement finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn job(target_dir: PathBuf, strategy: OrganizeStrategy, files: Vec<FilePlacement>) -> PlacementJob {
        PlacementJob {
            job_id: "test-job".to_string(),
            target_dir,
            strategy,
            files,
        }
    }

    fn placement(source: PathBuf, file_name: &str) -> FilePlacement {
        FilePlacement {
            item_id: "item-1".to_string(),
            source,
            file_name: file_name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_link_creates_symlink() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("download.mkv");
        fs::write(&source, "video").await.unwrap();
        let target = temp.path().join("library/Dune (2021)");

        let report = FsPlacer::new()
            .place(job(
                target.clone(),
                OrganizeStrategy::Link,
                vec![placement(source.clone(), "Dune (2021) 1080p.mkv")],
            ))
            .await
            .unwrap();

        assert!(report.is_success());
        let dest = target.join("Dune (2021) 1080p.mkv");
        let meta = fs::symlink_metadata(&dest).await.unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(fs::read_link(&dest).await.unwrap(), source);
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_link_with_relative_source_points_at_absolute_path() {
        // Relative paths, as produced by a relative library base path
        let temp = TempDir::new_in(".").unwrap();
        let base = temp.path();
        assert!(base.is_relative());

        let source = base.join("downloads/complete/Dune.mkv");
        fs::create_dir_all(source.parent().unwrap()).await.unwrap();
        fs::write(&source, "video").await.unwrap();
        let target = base.join("movies/Dune (2021)");

        let report = FsPlacer::new()
            .place(job(
                target.clone(),
                OrganizeStrategy::Link,
                vec![placement(source.clone(), "Dune (2021).mkv")],
            ))
            .await
            .unwrap();

        assert!(report.is_success());
        let dest = target.join("Dune (2021).mkv");
        assert!(fs::read_link(&dest).await.unwrap().is_absolute());
        assert_eq!(fs::read_to_string(&dest).await.unwrap(), "video");
    }

    #[tokio::test]
    async fn test_move_removes_source() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("download.mkv");
        fs::write(&source, "video").await.unwrap();
        let target = temp.path().join("library");

        let report = FsPlacer::new()
            .place(job(
                target.clone(),
                OrganizeStrategy::Move,
                vec![placement(source.clone(), "movie.mkv")],
            ))
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.total_bytes(), 5);
        assert!(!source.exists());
        let content = fs::read_to_string(target.join("movie.mkv")).await.unwrap();
        assert_eq!(content, "video");
    }

    #[tokio::test]
    async fn test_copy_directory_recursively() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("Extras");
        fs::create_dir_all(source.join("nested")).await.unwrap();
        fs::write(source.join("a.txt"), "aa").await.unwrap();
        fs::write(source.join("nested/b.txt"), "bbb").await.unwrap();
        let target = temp.path().join("library");

        let report = FsPlacer::new()
            .place(job(
                target.clone(),
                OrganizeStrategy::Copy,
                vec![placement(source.clone(), "Extras")],
            ))
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.total_bytes(), 5);
        assert!(target.join("Extras/a.txt").exists());
        assert!(target.join("Extras/nested/b.txt").exists());
        assert!(source.join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_rerun_replaces_destination() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("download.mkv");
        fs::write(&source, "new").await.unwrap();
        let target = temp.path().join("library");
        fs::create_dir_all(&target).await.unwrap();
        fs::write(target.join("movie.mkv"), "old").await.unwrap();

        let placer = FsPlacer::new();
        for _ in 0..2 {
            let report = placer
                .place(job(
                    target.clone(),
                    OrganizeStrategy::Link,
                    vec![placement(source.clone(), "movie.mkv")],
                ))
                .await
                .unwrap();
            assert!(report.is_success());
        }

        let content = fs::read_to_string(target.join("movie.mkv")).await.unwrap();
        assert_eq!(content, "new");
    }

    #[tokio::test]
    async fn test_failure_stops_and_skips_rest() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("ep1.mkv");
        let missing = temp.path().join("ep2.mkv");
        let third = temp.path().join("ep3.mkv");
        fs::write(&first, "1").await.unwrap();
        fs::write(&third, "3").await.unwrap();
        let target = temp.path().join("library");

        let report = FsPlacer::new()
            .place(job(
                target.clone(),
                OrganizeStrategy::Copy,
                vec![
                    placement(first, "E01.mkv"),
                    placement(missing, "E02.mkv"),
                    placement(third, "E03.mkv"),
                ],
            ))
            .await
            .unwrap();

        assert!(matches!(report.files[0].outcome, FileOutcome::Placed { .. }));
        assert!(matches!(report.files[1].outcome, FileOutcome::Failed { .. }));
        assert_eq!(report.files[2].outcome, FileOutcome::Skipped);

        // No rollback: the first file stays placed
        assert!(target.join("E01.mkv").exists());
        assert!(!target.join("E03.mkv").exists());

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, PlacerError::PartialFailure { placed: 1, .. }));
    }

    #[tokio::test]
    async fn test_uncreatable_target_dir() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, "x").await.unwrap();

        let result = FsPlacer::new()
            .place(job(blocker.join("sub"), OrganizeStrategy::Copy, vec![]))
            .await;

        assert!(matches!(
            result,
            Err(PlacerError::DirectoryCreationFailed { .. })
        ));
    }
}
