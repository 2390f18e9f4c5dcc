use crate::media::{
    EpisodeWithContext, FileOwner, FileRecord, MediaRef, MediaState, MissingMedia, Movie,
    Season, SeasonWithEpisodes, TorrentRecord, TvShow, Episode,
};

use super::{LibraryUpdate, NewEpisode, NewMovie, NewSeason, NewTorrent, StoreError};

/// Runtime parameters (key/value), e.g. `organize_library_strategy`.
pub trait ParamStore: Send + Sync {
    fn get_param(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set_param(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Persistent library state.
pub trait LibraryStore: ParamStore {
    fn insert_movie(&self, movie: NewMovie) -> Result<Movie, StoreError>;

    fn insert_show(&self, title: &str) -> Result<TvShow, StoreError>;

    fn insert_season(&self, season: NewSeason) -> Result<Season, StoreError>;

    fn insert_episode(&self, episode: NewEpisode) -> Result<Episode, StoreError>;

    /// Attaches a torrent to a media unit. One torrent per unit.
    fn insert_torrent(&self, torrent: NewTorrent) -> Result<TorrentRecord, StoreError>;

    fn get_movie(&self, id: i64) -> Result<Option<Movie>, StoreError>;

    /// Loads a season with its show and episodes (ordered by number).
    fn get_season(&self, id: i64) -> Result<Option<SeasonWithEpisodes>, StoreError>;

    /// Loads an episode with its season and show.
    fn get_episode(&self, id: i64) -> Result<Option<EpisodeWithContext>, StoreError>;

    /// Current lifecycle state of a unit, `None` if it does not exist.
    fn media_state(&self, media: MediaRef) -> Result<Option<MediaState>, StoreError>;

    /// Sets the state of a single unit.
    fn set_state(&self, media: MediaRef, state: MediaState) -> Result<(), StoreError>;

    fn torrent_for(&self, media: MediaRef) -> Result<Option<TorrentRecord>, StoreError>;

    fn list_torrents(&self) -> Result<Vec<TorrentRecord>, StoreError>;

    fn files_for(&self, owner: FileOwner) -> Result<Vec<FileRecord>, StoreError>;

    /// Units in the MISSING state. Episodes of a missing season are left
    /// out, the season download covers them.
    fn list_missing(&self) -> Result<MissingMedia, StoreError>;

    /// Applies an organize job's writes in a single transaction.
    fn commit_update(&self, update: &LibraryUpdate) -> Result<(), StoreError>;
}
