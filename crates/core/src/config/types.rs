use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::jobs::JobsConfig;
use crate::media::OrganizeStrategy;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub library: LibraryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub torrent_client: Option<TorrentClientConfig>,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("reelkeeper.db")
}

/// Library layout and placement defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Root of the library; relative folders below resolve against it.
    pub base_path: PathBuf,
    /// Folder holding one sub-folder per movie.
    #[serde(default = "default_movies_folder")]
    pub movies_folder: String,
    /// Folder holding one sub-folder per show.
    #[serde(default = "default_tv_shows_folder")]
    pub tv_shows_folder: String,
    /// Where the torrent client puts completed downloads.
    #[serde(default = "default_downloads_folder")]
    pub downloads_folder: PathBuf,
    /// Strategy used when the params table has no value.
    #[serde(default = "default_strategy")]
    pub organize_strategy: OrganizeStrategy,
    /// Media file extensions, without the leading dot.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl LibraryConfig {
    /// Creates a config rooted at `base_path` with every other field defaulted.
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            movies_folder: default_movies_folder(),
            tv_shows_folder: default_tv_shows_folder(),
            downloads_folder: default_downloads_folder(),
            organize_strategy: default_strategy(),
            allowed_extensions: default_allowed_extensions(),
        }
    }

    pub fn movies_dir(&self) -> PathBuf {
        self.base_path.join(&self.movies_folder)
    }

    pub fn tv_shows_dir(&self) -> PathBuf {
        self.base_path.join(&self.tv_shows_folder)
    }

    /// Completed downloads directory. An absolute `downloads_folder` is used as-is.
    pub fn downloads_dir(&self) -> PathBuf {
        if self.downloads_folder.is_absolute() {
            self.downloads_folder.clone()
        } else {
            self.base_path.join(&self.downloads_folder)
        }
    }
}

fn default_movies_folder() -> String {
    "movies".to_string()
}

fn default_tv_shows_folder() -> String {
    "tvshows".to_string()
}

fn default_downloads_folder() -> PathBuf {
    PathBuf::from("downloads/complete")
}

fn default_strategy() -> OrganizeStrategy {
    OrganizeStrategy::Link
}

fn default_allowed_extensions() -> Vec<String> {
    ["mkv", "mp4", "avi", "mov", "wmv", "m4v", "webm", "ts", "m2ts", "mpg", "mpeg"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Torrent client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorrentClientConfig {
    pub backend: TorrentClientBackend,
    /// Required when backend = "qbittorrent".
    #[serde(default)]
    pub qbittorrent: Option<QBittorrentConfig>,
}

/// Available torrent client backends
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TorrentClientBackend {
    #[serde(rename = "qbittorrent")]
    QBittorrent,
}

/// qBittorrent Web API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Web UI URL (e.g., "http://localhost:8080")
    pub url: String,
    pub username: String,
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Log output configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub library: LibraryConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torrent_client: Option<SanitizedTorrentClientConfig>,
    pub jobs: JobsConfig,
}

/// Sanitized torrent client config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTorrentClientConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub password_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            library: config.library.clone(),
            torrent_client: config.torrent_client.as_ref().map(|tc| {
                SanitizedTorrentClientConfig {
                    backend: match tc.backend {
                        TorrentClientBackend::QBittorrent => "qbittorrent".to_string(),
                    },
                    url: tc.qbittorrent.as_ref().map(|q| q.url.clone()),
                    password_configured: tc
                        .qbittorrent
                        .as_ref()
                        .is_some_and(|q| !q.password.is_empty()),
                }
            }),
            jobs: config.jobs.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[library]
base_path = "/srv/library"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "reelkeeper.db");
        assert_eq!(config.library.movies_folder, "movies");
        assert_eq!(config.library.tv_shows_folder, "tvshows");
        assert_eq!(config.library.organize_strategy, OrganizeStrategy::Link);
        assert!(config.library.allowed_extensions.contains(&"mkv".to_string()));
        assert!(config.torrent_client.is_none());
        assert!(!config.logging.json);
    }

    #[test]
    fn test_deserialize_missing_library_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_library_dirs() {
        let library = LibraryConfig::with_base_path("/srv/library");
        assert_eq!(library.movies_dir(), PathBuf::from("/srv/library/movies"));
        assert_eq!(library.tv_shows_dir(), PathBuf::from("/srv/library/tvshows"));
        assert_eq!(
            library.downloads_dir(),
            PathBuf::from("/srv/library/downloads/complete")
        );

        let absolute = LibraryConfig {
            downloads_folder: PathBuf::from("/mnt/torrents"),
            ..library
        };
        assert_eq!(absolute.downloads_dir(), PathBuf::from("/mnt/torrents"));
    }

    #[test]
    fn test_deserialize_with_torrent_client() {
        let toml = r#"
[library]
base_path = "/srv/library"
organize_strategy = "move"

[torrent_client]
backend = "qbittorrent"

[torrent_client.qbittorrent]
url = "http://localhost:8081"
username = "admin"
password = "adminadmin"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.library.organize_strategy, OrganizeStrategy::Move);

        let tc = config.torrent_client.as_ref().unwrap();
        assert_eq!(tc.backend, TorrentClientBackend::QBittorrent);
        let qbit = tc.qbittorrent.as_ref().unwrap();
        assert_eq!(qbit.url, "http://localhost:8081");
        assert_eq!(qbit.timeout_secs, 30);
    }

    #[test]
    fn test_sanitized_config_hides_password() {
        let config = Config {
            library: LibraryConfig::with_base_path("/srv/library"),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            torrent_client: Some(TorrentClientConfig {
                backend: TorrentClientBackend::QBittorrent,
                qbittorrent: Some(QBittorrentConfig {
                    url: "http://localhost:8081".to_string(),
                    username: "admin".to_string(),
                    password: "secret".to_string(),
                    timeout_secs: 10,
                }),
            }),
            jobs: JobsConfig::default(),
            logging: LoggingConfig::default(),
        };

        let sanitized = SanitizedConfig::from(&config);
        let tc = sanitized.torrent_client.as_ref().unwrap();
        assert_eq!(tc.backend, "qbittorrent");
        assert!(tc.password_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
    }
}
