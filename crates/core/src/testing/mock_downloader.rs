//! Mock downloader for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::jobs::{CollaboratorError, Downloader};

/// Mock implementation of the Downloader trait.
///
/// Records requested ids per media kind. Failed calls are recorded too.
#[derive(Debug, Default)]
pub struct MockDownloader {
    movies: Arc<RwLock<Vec<i64>>>,
    seasons: Arc<RwLock<Vec<i64>>>,
    episodes: Arc<RwLock<Vec<i64>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<CollaboratorError>>>,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn movies(&self) -> Vec<i64> {
        self.movies.read().await.clone()
    }

    pub async fn seasons(&self) -> Vec<i64> {
        self.seasons.read().await.clone()
    }

    pub async fn episodes(&self) -> Vec<i64> {
        self.episodes.read().await.clone()
    }

    /// Make the next call fail with the given error.
    pub async fn fail_next(&self, error: CollaboratorError) {
        *self.next_error.write().await = Some(error);
    }

    async fn record(&self, calls: &RwLock<Vec<i64>>, id: i64) -> Result<(), CollaboratorError> {
        calls.write().await.push(id);
        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download_movie(&self, movie_id: i64) -> Result<(), CollaboratorError> {
        self.record(&self.movies, movie_id).await
    }

    async fn download_season(&self, season_id: i64) -> Result<(), CollaboratorError> {
        self.record(&self.seasons, season_id).await
    }

    async fn download_episode(&self, episode_id: i64) -> Result<(), CollaboratorError> {
        self.record(&self.episodes, episode_id).await
    }
}
