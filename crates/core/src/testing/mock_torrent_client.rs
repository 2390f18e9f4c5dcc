//! Mock torrent client for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::torrent_client::{
    TorrentClient, TorrentClientError, TorrentFile, TorrentInfo, TorrentState,
};

/// Mock implementation of the TorrentClient trait.
///
/// Provides controllable behavior for testing:
/// - Control torrent progress and file lists
/// - Track removals for assertions
/// - Simulate failures
///
/// Hashes are compared case-insensitively.
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTorrentClient::new();
///
/// client.set_progress("abc123", 0.5).await;
/// client.set_progress("abc123", 1.0).await; // Complete
///
/// let info = client.get_torrent("abc123").await?;
/// assert_eq!(info.state, TorrentState::Seeding);
///
/// client.remove_torrent("abc123", true).await?;
/// assert_eq!(client.removed().await, vec![("abc123".to_string(), true)]);
/// ```
#[derive(Debug, Default)]
pub struct MockTorrentClient {
    /// Current torrent states by hash.
    torrents: Arc<RwLock<HashMap<String, TorrentInfo>>>,
    /// File lists by hash.
    files: Arc<RwLock<HashMap<String, Vec<TorrentFile>>>>,
    /// Recorded remove_torrent calls.
    removed: Arc<RwLock<Vec<(String, bool)>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<TorrentClientError>>>,
}

impl MockTorrentClient {
    /// Create a new mock torrent client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the progress for a torrent (0.0 to 1.0), adding it if unknown.
    ///
    /// When progress reaches 1.0, the torrent state changes to Seeding.
    pub async fn set_progress(&self, hash: &str, progress: f64) {
        let hash = hash.to_lowercase();
        let progress = progress.clamp(0.0, 1.0);
        let mut torrents = self.torrents.write().await;
        let torrent = torrents.entry(hash.clone()).or_insert_with(|| TorrentInfo {
            hash: hash.clone(),
            name: format!("torrent-{}", hash),
            state: TorrentState::Downloading,
            progress: 0.0,
            size_bytes: 0,
            save_path: None,
        });

        torrent.progress = progress;
        torrent.state = if progress >= 1.0 {
            TorrentState::Seeding
        } else {
            TorrentState::Downloading
        };
    }

    /// Set the state for a known torrent directly.
    pub async fn set_state(&self, hash: &str, state: TorrentState) {
        if let Some(torrent) = self.torrents.write().await.get_mut(&hash.to_lowercase()) {
            torrent.state = state;
        }
    }

    /// Set the file list returned by `get_files`.
    pub async fn set_files(&self, hash: &str, files: Vec<TorrentFile>) {
        self.files.write().await.insert(hash.to_lowercase(), files);
    }

    /// Get all recorded remove_torrent calls as `(hash, delete_files)`.
    pub async fn removed(&self) -> Vec<(String, bool)> {
        self.removed.read().await.clone()
    }

    /// Clear recorded removals.
    pub async fn clear_recorded(&self) {
        self.removed.write().await.clear();
    }

    /// Make the next operation fail with the given error.
    pub async fn set_next_error(&self, error: TorrentClientError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Result<(), TorrentClientError> {
        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentInfo>, TorrentClientError> {
        self.take_error().await?;
        Ok(self.torrents.read().await.values().cloned().collect())
    }

    async fn get_torrent(&self, hash: &str) -> Result<TorrentInfo, TorrentClientError> {
        self.take_error().await?;
        self.torrents
            .read()
            .await
            .get(&hash.to_lowercase())
            .cloned()
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.to_string()))
    }

    async fn get_files(&self, hash: &str) -> Result<Vec<TorrentFile>, TorrentClientError> {
        self.take_error().await?;
        self.files
            .read()
            .await
            .get(&hash.to_lowercase())
            .cloned()
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.to_string()))
    }

    async fn remove_torrent(
        &self,
        hash: &str,
        delete_files: bool,
    ) -> Result<(), TorrentClientError> {
        self.take_error().await?;
        let hash = hash.to_lowercase();
        self.torrents.write().await.remove(&hash);
        self.files.write().await.remove(&hash);
        self.removed.write().await.push((hash, delete_files));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_progress_lifecycle() {
        let client = MockTorrentClient::new();
        client.set_progress("ABC", 0.5).await;

        let info = client.get_torrent("abc").await.unwrap();
        assert_eq!(info.state, TorrentState::Downloading);
        assert!(!info.is_complete());

        client.set_progress("abc", 1.0).await;
        let info = client.get_torrent("abc").await.unwrap();
        assert_eq!(info.state, TorrentState::Seeding);
        assert!(info.is_complete());
    }

    #[tokio::test]
    async fn test_unknown_torrent() {
        let client = MockTorrentClient::new();
        let result = client.get_files("missing").await;
        assert!(matches!(result, Err(TorrentClientError::TorrentNotFound(_))));
    }

    #[tokio::test]
    async fn test_next_error_is_consumed() {
        let client = MockTorrentClient::new();
        client.set_files("abc", vec![TorrentFile::new("a.mkv", 1)]).await;
        client.set_next_error(TorrentClientError::Timeout).await;

        assert!(matches!(
            client.get_files("abc").await,
            Err(TorrentClientError::Timeout)
        ));
        assert_eq!(client.get_files("abc").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_records_call() {
        let client = MockTorrentClient::new();
        client.set_progress("abc", 1.0).await;
        client.remove_torrent("ABC", true).await.unwrap();

        assert_eq!(client.removed().await, vec![("abc".to_string(), true)]);
        assert!(client.list_torrents().await.unwrap().is_empty());
    }
}
