//! Job orchestrator integration tests.
//!
//! A finished download travels through the queues on its own:
//! refresh-torrents -> organize-library -> PROCESSED

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::fs;
use uuid::Uuid;

use reelkeeper_core::{
    jobs::{Job, ORGANIZE_STRATEGY_PARAM},
    store::ParamStore,
    testing::{fixtures, MockDownloader, MockTorrentClient},
    torrent_client::TorrentFile,
    FsPlacer, JobOrchestrator, JobQueue, JobRecord, JobStatus, JobsConfig, LibraryConfig,
    LibraryStore, MediaRef, MediaState, OrganizeStrategy, Organizer, SqliteLibraryStore,
};

struct TestHarness {
    store: Arc<SqliteLibraryStore>,
    torrent_client: Arc<MockTorrentClient>,
    downloader: Arc<MockDownloader>,
    library: LibraryConfig,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(
            SqliteLibraryStore::new(&temp_dir.path().join("library.db"))
                .expect("Failed to create store"),
        );

        Self {
            store,
            torrent_client: Arc::new(MockTorrentClient::new()),
            downloader: Arc::new(MockDownloader::new()),
            library: LibraryConfig::with_base_path(temp_dir.path()),
            _temp_dir: temp_dir,
        }
    }

    fn create_orchestrator(&self) -> JobOrchestrator {
        let config = JobsConfig {
            enabled: false, // Jobs are triggered by hand
            retry_base_delay_ms: 10,
            ..Default::default()
        };
        let organizer = Arc::new(Organizer::new(
            self.store.clone(),
            self.torrent_client.clone(),
            Arc::new(FsPlacer::new()),
            self.library.clone(),
        ));

        JobOrchestrator::new(
            config,
            self.store.clone(),
            self.torrent_client.clone(),
            organizer,
        )
        .with_downloader(self.downloader.clone())
    }

    async fn download(&self, name: &str) -> TorrentFile {
        let path = self.library.downloads_dir().join(name);
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, name).await.unwrap();
        TorrentFile::new(name, name.len() as u64)
    }
}

async fn wait_for_final(orchestrator: &JobOrchestrator, id: Uuid) -> JobRecord {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let record = orchestrator.job(id).await.expect("job should exist");
        if record.status.is_final() {
            return record;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {} stuck in {:?}",
            id,
            record.status
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn organize_jobs(orchestrator: &JobOrchestrator) -> Vec<JobRecord> {
    orchestrator
        .jobs()
        .await
        .into_iter()
        .filter(|job| job.queue == JobQueue::Organize)
        .collect()
}

#[tokio::test]
async fn test_finished_download_is_organized_with_param_strategy() {
    let h = TestHarness::new();
    let movie = fixtures::movie(h.store.as_ref(), "Dune", Some(2021));
    let media = MediaRef::Movie(movie.id);
    fixtures::torrent(h.store.as_ref(), "dune", media);
    let file = h.download("Dune.2021.2160p.mkv").await;
    h.torrent_client.set_files("dune", vec![file]).await;
    h.torrent_client.set_progress("dune", 1.0).await;
    h.store.set_param(ORGANIZE_STRATEGY_PARAM, "move").unwrap();

    let orchestrator = h.create_orchestrator();
    orchestrator.start().await.unwrap();

    let refresh = orchestrator.refresh_torrents().await.unwrap();
    assert_eq!(refresh.name, "refresh-torrents");
    assert_eq!(
        wait_for_final(&orchestrator, refresh.id).await.status,
        JobStatus::Completed
    );

    let organize = organize_jobs(&orchestrator).await;
    assert_eq!(organize.len(), 1);
    assert_eq!(
        organize[0].job,
        Job::Organize {
            media,
            strategy: OrganizeStrategy::Move
        }
    );
    let record = wait_for_final(&orchestrator, organize[0].id).await;
    assert_eq!(record.status, JobStatus::Completed);

    assert_eq!(h.store.media_state(media).unwrap(), Some(MediaState::Processed));
    assert!(h.store.torrent_for(media).unwrap().is_none());
    assert_eq!(
        h.torrent_client.removed().await,
        vec![("dune".to_string(), true)]
    );
    assert!(h
        .library
        .movies_dir()
        .join("Dune (2021)/Dune (2021) 1080p.mkv")
        .exists());

    // Nothing left downloading: a second refresh enqueues nothing
    let refresh = orchestrator.refresh_torrents().await.unwrap();
    wait_for_final(&orchestrator, refresh.id).await;
    assert_eq!(organize_jobs(&orchestrator).await.len(), 1);

    orchestrator.stop().await;
}

#[tokio::test]
async fn test_transient_client_error_is_retried() {
    let h = TestHarness::new();
    let movie = fixtures::movie(h.store.as_ref(), "Heat", Some(1995));
    let media = MediaRef::Movie(movie.id);
    fixtures::torrent(h.store.as_ref(), "heat", media);
    let file = h.download("Heat.mkv").await;
    h.torrent_client.set_files("heat", vec![file]).await;
    h.torrent_client
        .set_next_error(reelkeeper_core::torrent_client::TorrentClientError::Timeout)
        .await;

    let orchestrator = h.create_orchestrator();
    orchestrator.start().await.unwrap();

    let handle = orchestrator.organize(media).await.unwrap();
    let record = wait_for_final(&orchestrator, handle.id).await;

    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.attempts, 2);
    assert!(record
        .last_error
        .as_deref()
        .is_some_and(|e| e.contains("Request timeout")));
    assert_eq!(h.store.media_state(media).unwrap(), Some(MediaState::Processed));

    orchestrator.stop().await;
}

#[tokio::test]
async fn test_download_sweep_covers_missing_units() {
    let h = TestHarness::new();
    let movie = fixtures::movie(h.store.as_ref(), "Alien", Some(1979));
    h.store
        .set_state(MediaRef::Movie(movie.id), MediaState::Missing)
        .unwrap();
    let season = fixtures::season(h.store.as_ref(), "Foo", 2, 3);
    h.store
        .set_state(MediaRef::Season(season.season.id), MediaState::Missing)
        .unwrap();
    // Episodes of a missing season are covered by the season download
    h.store
        .set_state(MediaRef::Episode(season.episodes[0].id), MediaState::Missing)
        .unwrap();

    let orchestrator = h.create_orchestrator();
    orchestrator.start().await.unwrap();

    let sweep = orchestrator.download_missing().await.unwrap();
    wait_for_final(&orchestrator, sweep.id).await;
    for job in orchestrator.jobs().await {
        assert_eq!(
            wait_for_final(&orchestrator, job.id).await.status,
            JobStatus::Completed
        );
    }

    assert_eq!(h.downloader.movies().await, vec![movie.id]);
    assert_eq!(h.downloader.seasons().await, vec![season.season.id]);
    assert!(h.downloader.episodes().await.is_empty());

    orchestrator.stop().await;
}
