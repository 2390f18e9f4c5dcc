use super::{types::Config, ConfigError, TorrentClientBackend};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Library base path is absolute
/// - Library folder names and extension list are not empty
/// - Job retry budget is at least one attempt
/// - Cron expressions have six or seven fields
/// - A selected torrent client backend has its section
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let library = &config.library;
    if !library.base_path.is_absolute() {
        return Err(ConfigError::ValidationError(format!(
            "library.base_path must be absolute, got {:?}",
            library.base_path
        )));
    }
    if library.movies_folder.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "library.movies_folder cannot be empty".to_string(),
        ));
    }
    if library.tv_shows_folder.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "library.tv_shows_folder cannot be empty".to_string(),
        ));
    }
    if library.allowed_extensions.is_empty() {
        return Err(ConfigError::ValidationError(
            "library.allowed_extensions cannot be empty".to_string(),
        ));
    }

    if config.jobs.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "jobs.max_attempts must be at least 1".to_string(),
        ));
    }

    for (name, expr) in config.jobs.schedules() {
        let fields = expr.split_whitespace().count();
        if !(6..=7).contains(&fields) {
            return Err(ConfigError::ValidationError(format!(
                "jobs.{} must have 6 or 7 fields, got {}: {:?}",
                name, fields, expr
            )));
        }
    }

    if let Some(tc) = &config.torrent_client {
        match tc.backend {
            TorrentClientBackend::QBittorrent if tc.qbittorrent.is_none() => {
                return Err(ConfigError::ValidationError(
                    "torrent_client.qbittorrent is required for the qbittorrent backend"
                        .to_string(),
                ));
            }
            TorrentClientBackend::QBittorrent => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        DatabaseConfig, LibraryConfig, LoggingConfig, ServerConfig, TorrentClientConfig,
    };
    use crate::jobs::JobsConfig;

    fn valid_config() -> Config {
        Config {
            library: LibraryConfig::with_base_path("/srv/library"),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            torrent_client: None,
            jobs: JobsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_extensions_fails() {
        let mut config = valid_config();
        config.library.allowed_extensions.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_relative_base_path_fails() {
        let mut config = valid_config();
        config.library.base_path = "library".into();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("library.base_path"));
    }

    #[test]
    fn test_validate_blank_folder_fails() {
        let mut config = valid_config();
        config.library.movies_folder = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_attempts_fails() {
        let mut config = valid_config();
        config.jobs.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_short_cron_fails() {
        let mut config = valid_config();
        config.jobs.refresh_torrents_cron = "*/1 * * * *".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("refresh_torrents_cron"));
    }

    #[test]
    fn test_validate_backend_without_section_fails() {
        let mut config = valid_config();
        config.torrent_client = Some(TorrentClientConfig {
            backend: TorrentClientBackend::QBittorrent,
            qbittorrent: None,
        });
        assert!(validate_config(&config).is_err());
    }
}
