pub mod config;
pub mod jobs;
pub mod matcher;
pub mod media;
pub mod metrics;
pub mod naming;
pub mod organizer;
pub mod placer;
pub mod store;
pub mod testing;
pub mod torrent_client;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LibraryConfig,
    SanitizedConfig,
};
pub use jobs::{JobError, JobHandle, JobOrchestrator, JobQueue, JobRecord, JobStatus, JobsConfig};
pub use media::{MediaKind, MediaRef, MediaState, OrganizeStrategy};
pub use organizer::{OrganizeError, OrganizeSummary, Organizer};
pub use placer::{FsPlacer, Placer};
pub use store::{LibraryStore, SqliteLibraryStore};
pub use torrent_client::{QBittorrentClient, TorrentClient};
