//! External collaborators invoked by jobs.

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Temporary failure (network, rate limit).
    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("failed: {0}")]
    Failed(String),
}

impl CollaboratorError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CollaboratorError::Unavailable(_))
    }
}

/// Searches for a release and hands it to the torrent client.
///
/// Implementations attach the torrent record and move the unit to
/// DOWNLOADING.
#[async_trait]
pub trait Downloader: Send + Sync {
    fn name(&self) -> &str;

    async fn download_movie(&self, movie_id: i64) -> Result<(), CollaboratorError>;

    async fn download_season(&self, season_id: i64) -> Result<(), CollaboratorError>;

    async fn download_episode(&self, episode_id: i64) -> Result<(), CollaboratorError>;
}

/// Walks the library and an external catalog for new entries.
#[async_trait]
pub trait LibraryScanner: Send + Sync {
    fn name(&self) -> &str;

    async fn scan_library(&self) -> Result<(), CollaboratorError>;

    /// Adds newly aired episodes of tracked shows as MISSING.
    async fn find_new_episodes(&self) -> Result<(), CollaboratorError>;
}
