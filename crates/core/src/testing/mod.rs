//! Testing utilities and mock implementations.
//!
//! Mocks for every collaborator trait, so organize and job flows can be
//! exercised without a torrent client or a real library on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelkeeper_core::testing::{fixtures, MockPlacer, MockTorrentClient};
//!
//! let client = MockTorrentClient::new();
//! client.set_files("abc", vec![TorrentFile::new("Dune.mkv", 10)]).await;
//! client.set_progress("abc", 1.0).await;
//!
//! let movie = fixtures::movie(&store, "Dune", Some(2021));
//! fixtures::torrent(&store, "abc", MediaRef::Movie(movie.id));
//! ```

mod mock_downloader;
mod mock_library_scanner;
mod mock_placer;
mod mock_torrent_client;

pub use mock_downloader::MockDownloader;
pub use mock_library_scanner::MockLibraryScanner;
pub use mock_placer::MockPlacer;
pub use mock_torrent_client::MockTorrentClient;

/// Test fixtures and helper functions.
///
/// Fixtures panic on store errors; they are only meant for tests.
pub mod fixtures {
    use chrono::NaiveDate;

    use crate::media::{MediaRef, MediaState, Movie, SeasonWithEpisodes, TorrentRecord};
    use crate::store::{LibraryStore, NewEpisode, NewMovie, NewSeason, NewTorrent};

    /// Insert a DOWNLOADING movie. The year becomes a January 1st release date.
    pub fn movie(store: &dyn LibraryStore, title: &str, year: Option<i32>) -> Movie {
        store
            .insert_movie(NewMovie {
                title: title.to_string(),
                release_date: year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)),
                state: MediaState::Downloading,
            })
            .expect("insert movie fixture")
    }

    /// Insert a show with one DOWNLOADING season of `episode_count` episodes.
    pub fn season(
        store: &dyn LibraryStore,
        show_title: &str,
        season_number: u32,
        episode_count: u32,
    ) -> SeasonWithEpisodes {
        let show = store.insert_show(show_title).expect("insert show fixture");
        let season = store
            .insert_season(NewSeason {
                show_id: show.id,
                season_number,
                state: MediaState::Downloading,
            })
            .expect("insert season fixture");

        for episode_number in 1..=episode_count {
            store
                .insert_episode(NewEpisode {
                    season_id: season.id,
                    episode_number,
                    state: MediaState::Downloading,
                })
                .expect("insert episode fixture");
        }

        store
            .get_season(season.id)
            .expect("load season fixture")
            .expect("season fixture exists")
    }

    /// Attach a 1080p torrent with the "unknown" release tag.
    pub fn torrent(store: &dyn LibraryStore, hash: &str, media: MediaRef) -> TorrentRecord {
        store
            .insert_torrent(NewTorrent {
                hash: hash.to_string(),
                quality: "1080p".to_string(),
                tag: "unknown".to_string(),
                media,
            })
            .expect("insert torrent fixture")
    }
}
