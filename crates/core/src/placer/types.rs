//! Types for the placer module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::media::OrganizeStrategy;

use super::PlacerError;

/// A file placement job.
#[derive(Debug, Clone)]
pub struct PlacementJob {
    /// Job ID, for logs.
    pub job_id: String,
    /// Directory every file is placed into. Created if missing.
    pub target_dir: PathBuf,
    pub strategy: OrganizeStrategy,
    /// Files to place, in order.
    pub files: Vec<FilePlacement>,
}

/// A single file placement request.
#[derive(Debug, Clone)]
pub struct FilePlacement {
    /// Item ID (for tracking).
    pub item_id: String,
    /// Source path in the downloads directory.
    pub source: PathBuf,
    /// Final name inside `target_dir`.
    pub file_name: String,
}

/// What happened to one requested file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    Placed { destination: PathBuf, size_bytes: u64 },
    Failed { error: String },
    /// Not attempted because an earlier file failed.
    Skipped,
}

/// Per-file entry of a [`PlacementReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub item_id: String,
    pub source: PathBuf,
    pub outcome: FileOutcome,
}

/// Result of a placement job, one entry per requested file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementReport {
    pub job_id: String,
    pub strategy: OrganizeStrategy,
    pub files: Vec<FileReport>,
    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl PlacementReport {
    /// Placed files as `(item_id, destination)` pairs.
    pub fn placed(&self) -> impl Iterator<Item = (&str, &PathBuf)> {
        self.files.iter().filter_map(|f| match &f.outcome {
            FileOutcome::Placed { destination, .. } => Some((f.item_id.as_str(), destination)),
            _ => None,
        })
    }

    pub fn placed_count(&self) -> usize {
        self.placed().count()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files
            .iter()
            .map(|f| match f.outcome {
                FileOutcome::Placed { size_bytes, .. } => size_bytes,
                _ => 0,
            })
            .sum()
    }

    /// The first failed file, if any.
    pub fn failure(&self) -> Option<&FileReport> {
        self.files
            .iter()
            .find(|f| matches!(f.outcome, FileOutcome::Failed { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }

    /// Turns a report containing a failure into `PlacerError::PartialFailure`.
    pub fn into_result(self) -> Result<Self, PlacerError> {
        let failure = self.failure().map(|failed| {
            let reason = match &failed.outcome {
                FileOutcome::Failed { error } => error.clone(),
                _ => String::new(),
            };
            (failed.source.display().to_string(), reason)
        });

        match failure {
            None => Ok(self),
            Some((failed, reason)) => Err(PlacerError::PartialFailure {
                placed: self.placed_count(),
                failed,
                reason,
            }),
        }
    }
}
