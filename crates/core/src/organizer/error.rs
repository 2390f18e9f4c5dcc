use thiserror::Error;

use crate::matcher::MatchError;
use crate::media::{MediaRef, StrategyError};
use crate::placer::PlacerError;
use crate::store::StoreError;
use crate::torrent_client::TorrentClientError;

/// Errors from an organize job.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("File matching failed: {0}")]
    Match(#[from] MatchError),

    #[error("Invalid organize strategy: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Placement failed: {0}")]
    Placement(#[from] PlacerError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Torrent client error: {0}")]
    TorrentClient(#[from] TorrentClientError),

    #[error("No torrent attached to {0}")]
    TorrentNotFound(MediaRef),
}

impl OrganizeError {
    /// Whether running the job again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Match(_) | Self::Strategy(_) | Self::TorrentNotFound(_) => false,
            Self::Placement(e) => e.is_retryable(),
            Self::Store(e) => e.is_retryable(),
            Self::TorrentClient(e) => e.is_retryable(),
        }
    }
}
