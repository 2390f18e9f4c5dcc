//! Insert requests and the reconciliation write set.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::media::{FileOwner, MediaRef, MediaState};

/// Request to add a movie.
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub state: MediaState,
}

/// Request to add a season to an existing show.
#[derive(Debug, Clone)]
pub struct NewSeason {
    pub show_id: i64,
    pub season_number: u32,
    pub state: MediaState,
}

/// Request to add an episode to an existing season.
#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub season_id: i64,
    pub episode_number: u32,
    pub state: MediaState,
}

/// Request to attach a torrent to a media unit.
#[derive(Debug, Clone)]
pub struct NewTorrent {
    pub hash: String,
    pub quality: String,
    pub tag: String,
    pub media: MediaRef,
}

/// A file record to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFile {
    pub path: String,
    pub owner: FileOwner,
}

/// A lifecycle state write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub media: MediaRef,
    pub state: MediaState,
}

/// Everything one organize job writes, applied atomically by
/// [`LibraryStore::commit_update`](super::LibraryStore::commit_update).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryUpdate {
    pub state_changes: Vec<StateChange>,
    pub new_files: Vec<NewFile>,
    /// Torrent record to delete, by id.
    pub delete_torrent: Option<i64>,
}

impl LibraryUpdate {
    /// Units moved to `state` by this update.
    pub fn count_state(&self, state: MediaState) -> usize {
        self.state_changes.iter().filter(|c| c.state == state).count()
    }
}
