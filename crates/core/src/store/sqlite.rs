//! SQLite-backed library store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::media::{
    Episode, EpisodeWithContext, FileOwner, FileRecord, MediaKind, MediaRef, MediaState,
    MissingMedia, Movie, Season, SeasonWithEpisodes, TorrentRecord, TvShow,
};

use super::{
    LibraryStore, LibraryUpdate, NewEpisode, NewMovie, NewSeason, NewTorrent, ParamStore,
    StoreError,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed library store.
pub struct SqliteLibraryStore {
    conn: Mutex<Connection>,
}

impl SqliteLibraryStore {
    /// Create a new SQLite library store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite library store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS movies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                release_date TEXT,
                state TEXT NOT NULL DEFAULT 'missing'
            );

            CREATE TABLE IF NOT EXISTS tv_shows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS seasons (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                show_id INTEGER NOT NULL REFERENCES tv_shows(id) ON DELETE CASCADE,
                season_number INTEGER NOT NULL,
                state TEXT NOT NULL DEFAULT 'missing'
            );

            CREATE TABLE IF NOT EXISTS episodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                season_id INTEGER NOT NULL REFERENCES seasons(id) ON DELETE CASCADE,
                episode_number INTEGER NOT NULL,
                state TEXT NOT NULL DEFAULT 'missing'
            );

            CREATE TABLE IF NOT EXISTS torrents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hash TEXT NOT NULL,
                quality TEXT NOT NULL,
                tag TEXT NOT NULL,
                media_kind TEXT NOT NULL,
                media_id INTEGER NOT NULL,
                UNIQUE (media_kind, media_id)
            );

            CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL,
                movie_id INTEGER REFERENCES movies(id) ON DELETE CASCADE,
                episode_id INTEGER REFERENCES episodes(id) ON DELETE CASCADE,
                CHECK ((movie_id IS NULL) <> (episode_id IS NULL))
            );

            CREATE TABLE IF NOT EXISTS params (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_seasons_show ON seasons(show_id);
            CREATE INDEX IF NOT EXISTS idx_episodes_season ON episodes(season_id);
            CREATE INDEX IF NOT EXISTS idx_files_movie ON files(movie_id);
            CREATE INDEX IF NOT EXISTS idx_files_episode ON files(episode_id);
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Database(format!("connection lock poisoned: {}", e)))
    }

    fn table_for(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Movie => "movies",
            MediaKind::Season => "seasons",
            MediaKind::Episode => "episodes",
        }
    }

    fn parse_state(idx: usize, value: String) -> rusqlite::Result<MediaState> {
        MediaState::parse(&value).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                Box::new(StoreError::InvalidData(format!("media state {:?}", value))),
            )
        })
    }

    fn row_to_movie(row: &rusqlite::Row) -> rusqlite::Result<Movie> {
        let id: i64 = row.get(0)?;
        let release_date: Option<String> = row.get(2)?;
        Ok(Movie {
            id,
            title: row.get(1)?,
            release_date: release_date.and_then(|raw| Self::parse_release_date(id, &raw)),
            state: Self::parse_state(3, row.get(3)?)?,
        })
    }

    /// Unparsable dates are treated as unknown, which drops the year from
    /// the movie's folder name.
    fn parse_release_date(movie_id: i64, raw: &str) -> Option<NaiveDate> {
        match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(e) => {
                warn!(
                    movie_id,
                    release_date = raw,
                    error = %e,
                    "Unparsable release date, folder will omit the year"
                );
                None
            }
        }
    }

    fn row_to_season(row: &rusqlite::Row) -> rusqlite::Result<Season> {
        Ok(Season {
            id: row.get(0)?,
            show_id: row.get(1)?,
            season_number: row.get(2)?,
            state: Self::parse_state(3, row.get(3)?)?,
        })
    }

    fn row_to_episode(row: &rusqlite::Row) -> rusqlite::Result<Episode> {
        Ok(Episode {
            id: row.get(0)?,
            season_id: row.get(1)?,
            episode_number: row.get(2)?,
            state: Self::parse_state(3, row.get(3)?)?,
        })
    }

    fn row_to_torrent(row: &rusqlite::Row) -> rusqlite::Result<TorrentRecord> {
        let kind: String = row.get(4)?;
        let kind = MediaKind::parse(&kind).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                Box::new(StoreError::InvalidData(format!("media kind {:?}", kind))),
            )
        })?;
        Ok(TorrentRecord {
            id: row.get(0)?,
            hash: row.get(1)?,
            quality: row.get(2)?,
            tag: row.get(3)?,
            media: MediaRef::new(kind, row.get(5)?),
        })
    }

    fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<FileRecord> {
        let movie_id: Option<i64> = row.get(2)?;
        let episode_id: Option<i64> = row.get(3)?;
        let owner = match (movie_id, episode_id) {
            (Some(id), _) => FileOwner::Movie(id),
            (None, Some(id)) => FileOwner::Episode(id),
            (None, None) => {
                return Err(rusqlite::Error::FromSqlConversionFailure(
                    2,
                    Type::Null,
                    Box::new(StoreError::InvalidData("file without owner".to_string())),
                ))
            }
        };
        Ok(FileRecord {
            id: row.get(0)?,
            path: row.get(1)?,
            owner,
        })
    }

    fn get_show(conn: &Connection, id: i64) -> Result<Option<TvShow>, StoreError> {
        Ok(conn
            .query_row(
                "SELECT id, title FROM tv_shows WHERE id = ?",
                params![id],
                |row| {
                    Ok(TvShow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    fn get_season_row(conn: &Connection, id: i64) -> Result<Option<Season>, StoreError> {
        Ok(conn
            .query_row(
                "SELECT id, show_id, season_number, state FROM seasons WHERE id = ?",
                params![id],
                Self::row_to_season,
            )
            .optional()?)
    }

    /// Writes a state; errors with `NotFound` when no row matched.
    fn update_state(
        conn: &Connection,
        media: MediaRef,
        state: MediaState,
    ) -> Result<(), StoreError> {
        let sql = format!(
            "UPDATE {} SET state = ? WHERE id = ?",
            Self::table_for(media.kind())
        );
        let changed = conn.execute(&sql, params![state.as_str(), media.id()])?;
        if changed == 0 {
            return Err(StoreError::not_found(media));
        }
        Ok(())
    }

    fn insert_file(conn: &Connection, path: &str, owner: FileOwner) -> Result<(), StoreError> {
        let (movie_id, episode_id) = match owner {
            FileOwner::Movie(id) => (Some(id), None),
            FileOwner::Episode(id) => (None, Some(id)),
        };
        conn.execute(
            "INSERT INTO files (path, movie_id, episode_id) VALUES (?, ?, ?)",
            params![path, movie_id, episode_id],
        )?;
        Ok(())
    }

    fn ids_in_state(conn: &Connection, sql: &str) -> Result<Vec<i64>, StoreError> {
        let mut stmt = conn.prepare(sql)?;
        let ids = stmt
            .query_map(params![MediaState::Missing.as_str()], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }
}

impl ParamStore for SqliteLibraryStore {
    fn get_param(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT value FROM params WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn set_param(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO params (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

impl LibraryStore for SqliteLibraryStore {
    fn insert_movie(&self, movie: NewMovie) -> Result<Movie, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO movies (title, release_date, state) VALUES (?, ?, ?)",
            params![
                movie.title,
                movie.release_date.map(|d| d.format(DATE_FORMAT).to_string()),
                movie.state.as_str(),
            ],
        )?;

        Ok(Movie {
            id: conn.last_insert_rowid(),
            title: movie.title,
            release_date: movie.release_date,
            state: movie.state,
        })
    }

    fn insert_show(&self, title: &str) -> Result<TvShow, StoreError> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO tv_shows (title) VALUES (?)", params![title])?;
        Ok(TvShow {
            id: conn.last_insert_rowid(),
            title: title.to_string(),
        })
    }

    fn insert_season(&self, season: NewSeason) -> Result<Season, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO seasons (show_id, season_number, state) VALUES (?, ?, ?)",
            params![season.show_id, season.season_number, season.state.as_str()],
        )?;
        Ok(Season {
            id: conn.last_insert_rowid(),
            show_id: season.show_id,
            season_number: season.season_number,
            state: season.state,
        })
    }

    fn insert_episode(&self, episode: NewEpisode) -> Result<Episode, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO episodes (season_id, episode_number, state) VALUES (?, ?, ?)",
            params![
                episode.season_id,
                episode.episode_number,
                episode.state.as_str()
            ],
        )?;
        Ok(Episode {
            id: conn.last_insert_rowid(),
            season_id: episode.season_id,
            episode_number: episode.episode_number,
            state: episode.state,
        })
    }

    fn insert_torrent(&self, torrent: NewTorrent) -> Result<TorrentRecord, StoreError> {
        let conn = self.conn()?;
        let hash = torrent.hash.to_lowercase();
        conn.execute(
            "INSERT INTO torrents (hash, quality, tag, media_kind, media_id) VALUES (?, ?, ?, ?, ?)",
            params![
                hash,
                torrent.quality,
                torrent.tag,
                torrent.media.kind().as_str(),
                torrent.media.id(),
            ],
        )?;
        Ok(TorrentRecord {
            id: conn.last_insert_rowid(),
            hash,
            quality: torrent.quality,
            tag: torrent.tag,
            media: torrent.media,
        })
    }

    fn get_movie(&self, id: i64) -> Result<Option<Movie>, StoreError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, title, release_date, state FROM movies WHERE id = ?",
                params![id],
                Self::row_to_movie,
            )
            .optional()?)
    }

    fn get_season(&self, id: i64) -> Result<Option<SeasonWithEpisodes>, StoreError> {
        let conn = self.conn()?;

        let Some(season) = Self::get_season_row(&conn, id)? else {
            return Ok(None);
        };
        let show = Self::get_show(&conn, season.show_id)?
            .ok_or_else(|| StoreError::not_found(format!("show:{}", season.show_id)))?;

        let mut stmt = conn.prepare(
            "SELECT id, season_id, episode_number, state FROM episodes
             WHERE season_id = ? ORDER BY episode_number, id",
        )?;
        let episodes = stmt
            .query_map(params![id], Self::row_to_episode)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(SeasonWithEpisodes {
            season,
            show,
            episodes,
        }))
    }

    fn get_episode(&self, id: i64) -> Result<Option<EpisodeWithContext>, StoreError> {
        let conn = self.conn()?;

        let episode = conn
            .query_row(
                "SELECT id, season_id, episode_number, state FROM episodes WHERE id = ?",
                params![id],
                Self::row_to_episode,
            )
            .optional()?;
        let Some(episode) = episode else {
            return Ok(None);
        };

        let season = Self::get_season_row(&conn, episode.season_id)?
            .ok_or_else(|| StoreError::not_found(MediaRef::Season(episode.season_id)))?;
        let show = Self::get_show(&conn, season.show_id)?
            .ok_or_else(|| StoreError::not_found(format!("show:{}", season.show_id)))?;

        Ok(Some(EpisodeWithContext {
            episode,
            season,
            show,
        }))
    }

    fn media_state(&self, media: MediaRef) -> Result<Option<MediaState>, StoreError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT state FROM {} WHERE id = ?",
            Self::table_for(media.kind())
        );
        Ok(conn
            .query_row(&sql, params![media.id()], |row| {
                Self::parse_state(0, row.get(0)?)
            })
            .optional()?)
    }

    fn set_state(&self, media: MediaRef, state: MediaState) -> Result<(), StoreError> {
        let conn = self.conn()?;
        Self::update_state(&conn, media, state)
    }

    fn torrent_for(&self, media: MediaRef) -> Result<Option<TorrentRecord>, StoreError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, hash, quality, tag, media_kind, media_id FROM torrents
                 WHERE media_kind = ? AND media_id = ?",
                params![media.kind().as_str(), media.id()],
                Self::row_to_torrent,
            )
            .optional()?)
    }

    fn list_torrents(&self) -> Result<Vec<TorrentRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, hash, quality, tag, media_kind, media_id FROM torrents ORDER BY id",
        )?;
        let torrents = stmt
            .query_map([], Self::row_to_torrent)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(torrents)
    }

    fn files_for(&self, owner: FileOwner) -> Result<Vec<FileRecord>, StoreError> {
        let conn = self.conn()?;
        let (sql, id) = match owner {
            FileOwner::Movie(id) => (
                "SELECT id, path, movie_id, episode_id FROM files WHERE movie_id = ? ORDER BY id",
                id,
            ),
            FileOwner::Episode(id) => (
                "SELECT id, path, movie_id, episode_id FROM files WHERE episode_id = ? ORDER BY id",
                id,
            ),
        };
        let mut stmt = conn.prepare(sql)?;
        let files = stmt
            .query_map(params![id], Self::row_to_file)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(files)
    }

    fn list_missing(&self) -> Result<MissingMedia, StoreError> {
        let conn = self.conn()?;
        Ok(MissingMedia {
            movies: Self::ids_in_state(&conn, "SELECT id FROM movies WHERE state = ?1 ORDER BY id")?,
            seasons: Self::ids_in_state(
                &conn,
                "SELECT id FROM seasons WHERE state = ?1 ORDER BY id",
            )?,
            episodes: Self::ids_in_state(
                &conn,
                "SELECT e.id FROM episodes e JOIN seasons s ON s.id = e.season_id
                 WHERE e.state = ?1 AND s.state <> ?1 ORDER BY e.id",
            )?,
        })
    }

    fn commit_update(&self, update: &LibraryUpdate) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for change in &update.state_changes {
            Self::update_state(&tx, change.media, change.state)?;
        }
        for file in &update.new_files {
            Self::insert_file(&tx, &file.path, file.owner)?;
        }
        if let Some(torrent_id) = update.delete_torrent {
            tx.execute("DELETE FROM torrents WHERE id = ?", params![torrent_id])?;
        }

        // Dropping the transaction on an early return rolls it back
        tx.commit()?;

        debug!(
            states = update.state_changes.len(),
            files = update.new_files.len(),
            torrent_deleted = update.delete_torrent.is_some(),
            "Committed library update"
        );
        Ok(())
    }
}
