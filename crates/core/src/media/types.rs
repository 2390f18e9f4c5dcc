//! Media unit types.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Lifecycle of a media unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaState {
    /// Tracked but no file in the library.
    Missing,
    /// A torrent is attached and downloading.
    Downloading,
    /// Files are in the library.
    Processed,
}

impl MediaState {
    /// Returns the string representation stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaState::Missing => "missing",
            MediaState::Downloading => "downloading",
            MediaState::Processed => "processed",
        }
    }

    /// Parses the database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "missing" => Some(MediaState::Missing),
            "downloading" => Some(MediaState::Downloading),
            "processed" => Some(MediaState::Processed),
            _ => None,
        }
    }
}

/// Kind of media unit, without the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Episode,
    Season,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Episode => "episode",
            MediaKind::Season => "season",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(MediaKind::Movie),
            "episode" => Some(MediaKind::Episode),
            "season" => Some(MediaKind::Season),
            _ => None,
        }
    }
}

/// Reference to a single media unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum MediaRef {
    Movie(i64),
    Episode(i64),
    Season(i64),
}

impl MediaRef {
    /// Builds a reference from a kind and an identifier.
    pub fn new(kind: MediaKind, id: i64) -> Self {
        match kind {
            MediaKind::Movie => MediaRef::Movie(id),
            MediaKind::Episode => MediaRef::Episode(id),
            MediaKind::Season => MediaRef::Season(id),
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            MediaRef::Movie(_) => MediaKind::Movie,
            MediaRef::Episode(_) => MediaKind::Episode,
            MediaRef::Season(_) => MediaKind::Season,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            MediaRef::Movie(id) | MediaRef::Episode(id) | MediaRef::Season(id) => *id,
        }
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind().as_str(), self.id())
    }
}

/// A movie tracked by the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    pub state: MediaState,
}

impl Movie {
    /// Release year, if the release date is known.
    pub fn year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }
}

/// A TV show. Shows carry no lifecycle of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvShow {
    pub id: i64,
    pub title: String,
}

/// A season of a TV show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub id: i64,
    pub show_id: i64,
    pub season_number: u32,
    pub state: MediaState,
}

/// A single episode; belongs to exactly one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: i64,
    pub season_id: i64,
    pub episode_number: u32,
    pub state: MediaState,
}

/// A season loaded with its show and all of its episodes.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonWithEpisodes {
    pub season: Season,
    pub show: TvShow,
    pub episodes: Vec<Episode>,
}

/// An episode loaded with its season and show.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeWithContext {
    pub episode: Episode,
    pub season: Season,
    pub show: TvShow,
}

/// A torrent attached to one media unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentRecord {
    pub id: i64,
    /// Info hash (lowercase hex).
    pub hash: String,
    /// Quality label, e.g. "1080p".
    pub quality: String,
    /// Release group tag.
    pub tag: String,
    pub media: MediaRef,
}

/// Owner of a file record. Seasons never own files directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum FileOwner {
    Movie(i64),
    Episode(i64),
}

/// A file placed in the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub path: String,
    pub owner: FileOwner,
}

/// Media units still missing from the library.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingMedia {
    pub movies: Vec<i64>,
    pub seasons: Vec<i64>,
    pub episodes: Vec<i64>,
}

impl MissingMedia {
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty() && self.seasons.is_empty() && self.episodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.movies.len() + self.seasons.len() + self.episodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_state_roundtrip() {
        for state in [MediaState::Missing, MediaState::Downloading, MediaState::Processed] {
            assert_eq!(MediaState::parse(state.as_str()), Some(state));
        }
        assert_eq!(MediaState::parse("deleted"), None);
    }

    #[test]
    fn test_media_ref_parts() {
        let media = MediaRef::new(MediaKind::Season, 42);
        assert_eq!(media, MediaRef::Season(42));
        assert_eq!(media.kind(), MediaKind::Season);
        assert_eq!(media.id(), 42);
        assert_eq!(media.to_string(), "season:42");
    }

    #[test]
    fn test_media_ref_serialization() {
        let json = serde_json::to_value(MediaRef::Episode(7)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "episode", "id": 7 }));
    }

    #[test]
    fn test_movie_year() {
        let movie = Movie {
            id: 1,
            title: "Dune".to_string(),
            release_date: NaiveDate::from_ymd_opt(2021, 10, 22),
            state: MediaState::Missing,
        };
        assert_eq!(movie.year(), Some(2021));

        let undated = Movie {
            release_date: None,
            ..movie
        };
        assert_eq!(undated.year(), None);
    }

    #[test]
    fn test_missing_media_len() {
        let missing = MissingMedia {
            movies: vec![1, 2],
            seasons: vec![],
            episodes: vec![9],
        };
        assert_eq!(missing.len(), 3);
        assert!(!missing.is_empty());
        assert!(MissingMedia::default().is_empty());
    }
}
