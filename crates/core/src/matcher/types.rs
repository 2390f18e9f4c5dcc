//! Types produced by the matcher.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the matcher.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MatchError {
    /// No file of the torrent carried a recognizable episode marker.
    #[error("no matchable files among {} candidates: {files:?}", .files.len())]
    NoMatchableFiles { files: Vec<String> },
}

impl MatchError {
    /// Matching is deterministic, so a retry cannot change the outcome.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// What a matched file is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum FileRole {
    /// Main media file, renamed on placement.
    Media { extension: String },
    /// Companion file kept under its own name.
    Sidecar { file_name: String },
}

/// A file selected for a movie or single episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedFile {
    /// Name as reported by the torrent client.
    pub original: String,
    pub role: FileRole,
}

impl MatchedFile {
    pub fn is_media(&self) -> bool {
        matches!(self.role, FileRole::Media { .. })
    }
}

/// A file of a season batch with its parsed episode identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonFile {
    /// Name as reported by the torrent client.
    pub original: String,
    /// Extension without the dot, as written in the name.
    pub extension: String,
    /// Season number from the marker. The organizer trusts the target
    /// season, so this is informational.
    pub season: Option<u32>,
    pub episode: u32,
    /// Multi-part episodes (`Part 2`).
    pub part: Option<u32>,
}
