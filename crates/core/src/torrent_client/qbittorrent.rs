//! qBittorrent torrent client implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::QBittorrentConfig;

use super::{TorrentClient, TorrentClientError, TorrentFile, TorrentInfo, TorrentState};

/// qBittorrent client over the Web API v2.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    /// Set once a login succeeded; the cookie jar holds the session id.
    session: Arc<RwLock<bool>>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: QBittorrentConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| TorrentClientError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            config,
            session: Arc::new(RwLock::new(false)),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn map_send_error(e: reqwest::Error) -> TorrentClientError {
        if e.is_timeout() {
            TorrentClientError::Timeout
        } else if e.is_connect() {
            TorrentClientError::ConnectionFailed(e.to_string())
        } else {
            TorrentClientError::ApiError(e.to_string())
        }
    }

    /// Login and keep the session cookie.
    async fn login(&self) -> Result<(), TorrentClientError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());
        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            *self.session.write().await = true;
            Ok(())
        } else if body.contains("Fails.") || status == StatusCode::FORBIDDEN {
            Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(TorrentClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    async fn ensure_authenticated(&self) -> Result<(), TorrentClientError> {
        if *self.session.read().await {
            return Ok(());
        }
        self.login().await
    }

    /// Sends a request built by `build`, logging in again once on 403.
    async fn send<F>(&self, build: F) -> Result<String, TorrentClientError>
    where
        F: Fn(&Client, &str) -> RequestBuilder,
    {
        self.ensure_authenticated().await?;

        let base = self.base_url();
        let mut response = build(&self.client, base)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if response.status() == StatusCode::FORBIDDEN {
            warn!("qBittorrent session expired, re-authenticating");
            *self.session.write().await = false;
            self.login().await?;
            response = build(&self.client, base)
                .send()
                .await
                .map_err(Self::map_send_error)?;
        }

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TorrentClientError::TorrentNotFound(status.to_string()));
        }
        if !status.is_success() {
            return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| TorrentClientError::ApiError(e.to_string()))
    }

    fn parse<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, TorrentClientError> {
        serde_json::from_str(body)
            .map_err(|e| TorrentClientError::ApiError(format!("Failed to parse response: {}", e)))
    }
}

/// qBittorrent torrent info response.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    name: String,
    state: String,
    progress: f64,
    size: i64,
    #[serde(default)]
    save_path: String,
}

impl QBTorrentInfo {
    fn into_torrent_info(self) -> TorrentInfo {
        TorrentInfo {
            hash: self.hash.to_lowercase(),
            name: self.name,
            state: parse_qb_state(&self.state),
            progress: self.progress,
            size_bytes: self.size.max(0) as u64,
            save_path: if self.save_path.is_empty() {
                None
            } else {
                Some(self.save_path)
            },
        }
    }
}

/// qBittorrent file entry from `/torrents/files`.
#[derive(Debug, Deserialize)]
struct QBTorrentFile {
    name: String,
    size: i64,
}

/// Parse qBittorrent state string to TorrentState.
fn parse_qb_state(state: &str) -> TorrentState {
    match state {
        "downloading" | "forcedDL" | "metaDL" | "allocating" => TorrentState::Downloading,
        "uploading" | "forcedUP" => TorrentState::Seeding,
        "pausedDL" | "pausedUP" | "stoppedDL" | "stoppedUP" => TorrentState::Paused,
        "checkingDL" | "checkingUP" | "checkingResumeData" | "moving" => TorrentState::Checking,
        "queuedDL" | "queuedUP" => TorrentState::Queued,
        "stalledDL" | "stalledUP" => TorrentState::Stalled,
        "error" | "missingFiles" => TorrentState::Error,
        _ => TorrentState::Unknown,
    }
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentInfo>, TorrentClientError> {
        let body = self
            .send(|c, base| c.get(format!("{}/api/v2/torrents/info", base)))
            .await?;
        let torrents: Vec<QBTorrentInfo> = Self::parse(&body)?;
        Ok(torrents.into_iter().map(|t| t.into_torrent_info()).collect())
    }

    async fn get_torrent(&self, hash: &str) -> Result<TorrentInfo, TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        let body = self
            .send(|c, base| {
                c.get(format!("{}/api/v2/torrents/info", base))
                    .query(&[("hashes", hash_lower.as_str())])
            })
            .await?;

        let torrents: Vec<QBTorrentInfo> = Self::parse(&body)?;
        torrents
            .into_iter()
            .next()
            .map(|t| t.into_torrent_info())
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.to_string()))
    }

    async fn get_files(&self, hash: &str) -> Result<Vec<TorrentFile>, TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        let body = self
            .send(|c, base| {
                c.get(format!("{}/api/v2/torrents/files", base))
                    .query(&[("hash", hash_lower.as_str())])
            })
            .await
            .map_err(|e| match e {
                TorrentClientError::TorrentNotFound(_) => {
                    TorrentClientError::TorrentNotFound(hash.to_string())
                }
                other => other,
            })?;

        let files: Vec<QBTorrentFile> = Self::parse(&body)?;
        Ok(files
            .into_iter()
            .map(|f| TorrentFile::new(f.name, f.size.max(0) as u64))
            .collect())
    }

    async fn remove_torrent(
        &self,
        hash: &str,
        delete_files: bool,
    ) -> Result<(), TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        let delete_str = if delete_files { "true" } else { "false" };

        self.send(|c, base| {
            c.post(format!("{}/api/v2/torrents/delete", base))
                .form(&[("hashes", hash_lower.as_str()), ("deleteFiles", delete_str)])
        })
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qb_state() {
        assert_eq!(parse_qb_state("downloading"), TorrentState::Downloading);
        assert_eq!(parse_qb_state("uploading"), TorrentState::Seeding);
        assert_eq!(parse_qb_state("stoppedUP"), TorrentState::Paused);
        assert_eq!(parse_qb_state("checkingResumeData"), TorrentState::Checking);
        assert_eq!(parse_qb_state("queuedDL"), TorrentState::Queued);
        assert_eq!(parse_qb_state("stalledDL"), TorrentState::Stalled);
        assert_eq!(parse_qb_state("missingFiles"), TorrentState::Error);
        assert_eq!(parse_qb_state("somethingNew"), TorrentState::Unknown);
    }

    #[test]
    fn test_qb_torrent_info_conversion() {
        let json = r#"{
            "hash": "ABC123",
            "name": "Dune.2021.1080p",
            "state": "uploading",
            "progress": 1.0,
            "size": 1000000,
            "save_path": "/downloads/complete"
        }"#;
        let qb_info: QBTorrentInfo = serde_json::from_str(json).unwrap();

        let info = qb_info.into_torrent_info();
        assert_eq!(info.hash, "abc123");
        assert_eq!(info.state, TorrentState::Seeding);
        assert!(info.is_complete());
        assert_eq!(info.size_bytes, 1000000);
        assert_eq!(info.save_path.as_deref(), Some("/downloads/complete"));
    }

    #[test]
    fn test_qb_files_response() {
        let json = r#"[
            {"index": 0, "name": "Show S01/Show.S01E01.mkv", "size": 700, "progress": 1},
            {"index": 1, "name": "Show S01/sample.mkv", "size": -1, "progress": 1}
        ]"#;
        let files: Vec<QBTorrentFile> = serde_json::from_str(json).unwrap();
        let files: Vec<TorrentFile> = files
            .into_iter()
            .map(|f| TorrentFile::new(f.name, f.size.max(0) as u64))
            .collect();

        assert_eq!(files[0], TorrentFile::new("Show S01/Show.S01E01.mkv", 700));
        assert_eq!(files[1].size_bytes, 0);
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let client = QBittorrentClient::new(QBittorrentConfig {
            url: "http://localhost:8080/".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.name(), "qbittorrent");
    }
}
