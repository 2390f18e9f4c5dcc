//! State reconciliation plans.
//!
//! Pure functions turning placement results into a [`LibraryUpdate`]. The
//! update is applied by `LibraryStore::commit_update` in one transaction.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::matcher::SeasonFile;
use crate::media::{FileOwner, MediaRef, MediaState, OrganizeStrategy, SeasonWithEpisodes};
use crate::store::{LibraryUpdate, NewFile, StateChange};

/// A file that made it into the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedFile {
    /// Name as reported by the torrent client.
    pub original: String,
    pub destination: PathBuf,
}

fn torrent_to_delete(strategy: OrganizeStrategy, torrent_id: i64) -> Option<i64> {
    strategy.removes_torrent().then_some(torrent_id)
}

fn new_file(destination: &Path, owner: FileOwner) -> NewFile {
    NewFile {
        path: destination.to_string_lossy().into_owned(),
        owner,
    }
}

/// Movie organized: PROCESSED plus one record per placed file.
pub fn plan_movie(
    movie_id: i64,
    torrent_id: i64,
    strategy: OrganizeStrategy,
    placed: &[PlacedFile],
) -> LibraryUpdate {
    LibraryUpdate {
        state_changes: vec![StateChange {
            media: MediaRef::Movie(movie_id),
            state: MediaState::Processed,
        }],
        new_files: placed
            .iter()
            .map(|p| new_file(&p.destination, FileOwner::Movie(movie_id)))
            .collect(),
        delete_torrent: torrent_to_delete(strategy, torrent_id),
    }
}

/// Single episode organized: PROCESSED plus one record per placed file.
pub fn plan_episode(
    episode_id: i64,
    torrent_id: i64,
    strategy: OrganizeStrategy,
    placed: &[PlacedFile],
) -> LibraryUpdate {
    LibraryUpdate {
        state_changes: vec![StateChange {
            media: MediaRef::Episode(episode_id),
            state: MediaState::Processed,
        }],
        new_files: placed
            .iter()
            .map(|p| new_file(&p.destination, FileOwner::Episode(episode_id)))
            .collect(),
        delete_torrent: torrent_to_delete(strategy, torrent_id),
    }
}

/// Season batch organized.
///
/// Episodes with a matched file become PROCESSED, every other episode of
/// the season MISSING, and the season itself PROCESSED. File records are
/// only written for matched files whose episode exists in the season.
pub fn plan_season(
    season: &SeasonWithEpisodes,
    torrent_id: i64,
    strategy: OrganizeStrategy,
    matched: &[SeasonFile],
    placed: &[PlacedFile],
) -> LibraryUpdate {
    let matched_numbers: HashSet<u32> = matched.iter().map(|f| f.episode).collect();

    let mut state_changes: Vec<StateChange> = season
        .episodes
        .iter()
        .map(|episode| StateChange {
            media: MediaRef::Episode(episode.id),
            state: if matched_numbers.contains(&episode.episode_number) {
                MediaState::Processed
            } else {
                MediaState::Missing
            },
        })
        .collect();
    state_changes.push(StateChange {
        media: MediaRef::Season(season.season.id),
        state: MediaState::Processed,
    });

    let new_files = placed
        .iter()
        .filter_map(|p| {
            let file = matched.iter().find(|f| f.original == p.original)?;
            let episode = season
                .episodes
                .iter()
                .find(|e| e.episode_number == file.episode)?;
            Some(new_file(&p.destination, FileOwner::Episode(episode.id)))
        })
        .collect();

    LibraryUpdate {
        state_changes,
        new_files,
        delete_torrent: torrent_to_delete(strategy, torrent_id),
    }
}
