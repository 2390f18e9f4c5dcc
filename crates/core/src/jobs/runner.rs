//! Job orchestrator implementation.
//!
//! One unbounded channel per queue, drained by a single worker task:
//! - Jobs on the same queue run one at a time, in enqueue order
//! - Different queues run concurrently
//! - Retries are re-sent to the same queue after a backoff

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::OnceCell;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio_cron_scheduler::JobScheduler;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::media::{MediaRef, MediaState, OrganizeStrategy};
use crate::metrics;
use crate::organizer::Organizer;
use crate::store::LibraryStore;
use crate::torrent_client::{TorrentClient, TorrentClientError};

use super::collaborators::{Downloader, LibraryScanner};
use super::config::JobsConfig;
use super::error::JobError;
use super::schedule::{self, Trigger};
use super::types::{Job, JobHandle, JobQueue, JobRecord, JobStatus, JobsStatus};

/// Param key holding the runtime organize strategy.
pub const ORGANIZE_STRATEGY_PARAM: &str = "organize_library_strategy";

/// State shared between the public handle, the workers and the scheduler.
struct Inner {
    config: JobsConfig,
    store: Arc<dyn LibraryStore>,
    torrent_client: Arc<dyn TorrentClient>,
    organizer: Arc<Organizer>,
    downloader: OnceCell<Arc<dyn Downloader>>,
    scanner: OnceCell<Arc<dyn LibraryScanner>>,

    registry: RwLock<HashMap<Uuid, JobRecord>>,
    /// Organize job currently owning each media unit.
    organize_guard: Mutex<HashMap<MediaRef, Uuid>>,
    senders: HashMap<JobQueue, mpsc::UnboundedSender<Uuid>>,
}

/// Runs library jobs on named in-process queues.
pub struct JobOrchestrator {
    inner: Arc<Inner>,

    // Runtime state
    receivers: Mutex<Vec<(JobQueue, mpsc::UnboundedReceiver<Uuid>)>>,
    scheduler: Mutex<Option<JobScheduler>>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl JobOrchestrator {
    /// Create a new orchestrator. Jobs can be enqueued before `start`.
    pub fn new(
        config: JobsConfig,
        store: Arc<dyn LibraryStore>,
        torrent_client: Arc<dyn TorrentClient>,
        organizer: Arc<Organizer>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let mut senders = HashMap::new();
        let mut receivers = Vec::new();
        for queue in JobQueue::ALL {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.insert(queue, tx);
            receivers.push((queue, rx));
        }

        Self {
            inner: Arc::new(Inner {
                config,
                store,
                torrent_client,
                organizer,
                downloader: OnceCell::new(),
                scanner: OnceCell::new(),
                registry: RwLock::new(HashMap::new()),
                organize_guard: Mutex::new(HashMap::new()),
                senders,
            }),
            receivers: Mutex::new(receivers),
            scheduler: Mutex::new(None),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Sets the collaborator for download jobs. Only the first one set is kept.
    pub fn with_downloader(self, downloader: Arc<dyn Downloader>) -> Self {
        let name = downloader.name().to_string();
        if self.inner.downloader.set(downloader).is_err() {
            warn!(downloader = %name, "Downloader already set, ignoring");
        }
        self
    }

    /// Sets the collaborator for library scan jobs. Only the first one set is kept.
    pub fn with_scanner(self, scanner: Arc<dyn LibraryScanner>) -> Self {
        let name = scanner.name().to_string();
        if self.inner.scanner.set(scanner).is_err() {
            warn!(scanner = %name, "Library scanner already set, ignoring");
        }
        self
    }

    /// Start the queue workers and, if enabled, the cron triggers.
    pub async fn start(&self) -> Result<(), JobError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Job orchestrator already running");
            return Ok(());
        }

        info!("Starting job orchestrator");

        let receivers: Vec<_> = self.receivers.lock().await.drain(..).collect();
        if receivers.is_empty() {
            warn!("Job queues were already consumed, orchestrator cannot restart");
        }
        for (queue, rx) in receivers {
            self.spawn_worker(queue, rx);
        }

        if self.inner.config.enabled {
            let target: Arc<dyn Trigger> = self.inner.clone();
            let scheduler = schedule::start_scheduler(&self.inner.config, target).await?;
            *self.scheduler.lock().await = Some(scheduler);
        } else {
            info!("Recurring jobs disabled");
        }

        info!("Job orchestrator started");
        Ok(())
    }

    /// Stop the workers and the scheduler.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Job orchestrator not running");
            return;
        }

        info!("Stopping job orchestrator");

        if let Some(mut scheduler) = self.scheduler.lock().await.take() {
            if let Err(e) = scheduler.shutdown().await {
                warn!("Failed to stop job scheduler: {}", e);
            }
        }

        // Signal shutdown to all workers
        let _ = self.shutdown_tx.send(());

        info!("Job orchestrator stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Get a job by id.
    pub async fn job(&self, id: Uuid) -> Option<JobRecord> {
        self.inner.registry.read().await.get(&id).cloned()
    }

    /// All known jobs, oldest first.
    pub async fn jobs(&self) -> Vec<JobRecord> {
        let mut jobs: Vec<JobRecord> = self.inner.registry.read().await.values().cloned().collect();
        jobs.sort_by_key(|job| job.enqueued_at);
        jobs
    }

    /// Job counts per lifecycle status.
    pub async fn status(&self) -> JobsStatus {
        let registry = self.inner.registry.read().await;
        let count = |status: JobStatus| registry.values().filter(|j| j.status == status).count();

        JobsStatus {
            running: self.is_running(),
            enqueued: count(JobStatus::Enqueued),
            active: count(JobStatus::Active),
            completed: count(JobStatus::Completed),
            failed: count(JobStatus::Failed),
        }
    }

    pub async fn download_movie(&self, movie_id: i64) -> Result<JobHandle, JobError> {
        self.inner.enqueue(Job::DownloadMovie { movie_id }).await
    }

    pub async fn download_season(&self, season_id: i64) -> Result<JobHandle, JobError> {
        self.inner.enqueue(Job::DownloadSeason { season_id }).await
    }

    pub async fn download_episode(&self, episode_id: i64) -> Result<JobHandle, JobError> {
        self.inner.enqueue(Job::DownloadEpisode { episode_id }).await
    }

    pub async fn download_missing(&self) -> Result<JobHandle, JobError> {
        self.inner.enqueue(Job::DownloadMissing).await
    }

    pub async fn scan_library(&self) -> Result<JobHandle, JobError> {
        self.inner.enqueue(Job::ScanLibrary).await
    }

    pub async fn find_new_episodes(&self) -> Result<JobHandle, JobError> {
        self.inner.enqueue(Job::FindNewEpisodes).await
    }

    pub async fn refresh_torrents(&self) -> Result<JobHandle, JobError> {
        self.inner.enqueue(Job::RefreshTorrents).await
    }

    /// Enqueue an organize job for a media unit.
    ///
    /// Returns the pending job's handle if one already exists for `media`.
    pub async fn organize(&self, media: MediaRef) -> Result<JobHandle, JobError> {
        self.inner.enqueue_organize(media).await
    }

    /// Spawn the worker draining one queue.
    fn spawn_worker(&self, queue: JobQueue, mut rx: mpsc::UnboundedReceiver<Uuid>) {
        let inner = Arc::clone(&self.inner);
        let running = Arc::clone(&self.running);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!(%queue, "Queue worker started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!(%queue, "Queue worker received shutdown signal");
                        break;
                    }
                    id = rx.recv() => {
                        let Some(id) = id else { break };
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        inner.run(id).await;
                    }
                }
            }
            info!(%queue, "Queue worker stopped");
        });
    }
}

#[async_trait]
impl Trigger for Inner {
    async fn fire(&self, job: Job) {
        if let Err(e) = self.enqueue(job).await {
            warn!(job = job.name(), error = %e, "Failed to enqueue recurring job");
        }
    }
}

impl Inner {
    async fn enqueue(&self, job: Job) -> Result<JobHandle, JobError> {
        let record = JobRecord::new(job);
        let handle = record.handle();
        self.registry.write().await.insert(record.id, record);
        self.send(handle.queue, handle.id).await?;

        debug!(job_id = %handle.id, queue = %handle.queue, name = %handle.name, "Job enqueued");
        Ok(handle)
    }

    async fn enqueue_organize(&self, media: MediaRef) -> Result<JobHandle, JobError> {
        let mut guard = self.organize_guard.lock().await;

        if let Some(existing) = guard.get(&media) {
            if let Some(record) = self.registry.read().await.get(existing) {
                if !record.status.is_final() {
                    debug!(%media, job_id = %record.id, "Organize job already pending");
                    return Ok(record.handle());
                }
            }
        }

        let strategy = self.resolve_strategy()?;
        let handle = self.enqueue(Job::Organize { media, strategy }).await?;
        guard.insert(media, handle.id);

        info!(%media, %strategy, job_id = %handle.id, "Organize job enqueued");
        Ok(handle)
    }

    /// Runtime param first, config default second.
    fn resolve_strategy(&self) -> Result<OrganizeStrategy, JobError> {
        match self.store.get_param(ORGANIZE_STRATEGY_PARAM)? {
            Some(value) => Ok(value.parse()?),
            None => Ok(self.organizer.library().organize_strategy),
        }
    }

    async fn send(&self, queue: JobQueue, id: Uuid) -> Result<(), JobError> {
        let sender = self.senders.get(&queue).ok_or(JobError::QueueClosed(queue))?;
        if sender.send(id).is_err() {
            self.set_status(id, JobStatus::Failed, Some("queue closed".to_string()))
                .await;
            return Err(JobError::QueueClosed(queue));
        }
        Ok(())
    }

    /// Run one attempt of a job and record the outcome.
    async fn run(&self, id: Uuid) {
        let (job, attempt) = {
            let mut registry = self.registry.write().await;
            let Some(record) = registry.get_mut(&id) else {
                warn!(job_id = %id, "Dequeued unknown job");
                return;
            };
            record.status = JobStatus::Active;
            record.attempts += 1;
            record.updated_at = Utc::now();
            (record.job, record.attempts)
        };
        let queue = job.queue();

        info!(job_id = %id, %queue, name = job.name(), attempt, "Job started");
        let start = Instant::now();
        let result = self.execute(job).await;
        metrics::JOB_DURATION
            .with_label_values(&[queue.as_str()])
            .observe(start.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                info!(job_id = %id, %queue, name = job.name(), "Job completed");
                metrics::JOBS_TOTAL
                    .with_label_values(&[queue.as_str(), "completed"])
                    .inc();
                self.finish(id, JobStatus::Completed, None).await;
            }
            Err(e) if e.is_retryable() && attempt < self.config.max_attempts => {
                let delay = self.config.retry_delay(attempt);
                warn!(
                    job_id = %id,
                    %queue,
                    name = job.name(),
                    attempt,
                    error = %e,
                    "Job failed, retrying in {:?}",
                    delay
                );
                metrics::JOBS_TOTAL
                    .with_label_values(&[queue.as_str(), "retried"])
                    .inc();
                self.set_status(id, JobStatus::Enqueued, Some(e.to_string()))
                    .await;
                self.schedule_retry(queue, id, delay);
            }
            Err(e) => {
                error!(job_id = %id, %queue, name = job.name(), attempt, error = %e, "Job failed");
                metrics::JOBS_TOTAL
                    .with_label_values(&[queue.as_str(), "failed"])
                    .inc();
                self.finish(id, JobStatus::Failed, Some(e.to_string())).await;
            }
        }
    }

    fn schedule_retry(&self, queue: JobQueue, id: Uuid, delay: Duration) {
        let Some(sender) = self.senders.get(&queue).cloned() else {
            return;
        };
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sender.send(id).is_err() {
                debug!(job_id = %id, %queue, "Queue closed before retry");
            }
        });
    }

    async fn set_status(&self, id: Uuid, status: JobStatus, error: Option<String>) {
        if let Some(record) = self.registry.write().await.get_mut(&id) {
            record.status = status;
            if error.is_some() {
                record.last_error = error;
            }
            record.updated_at = Utc::now();
        }
    }

    /// Moves a job to a final status and releases its organize guard.
    async fn finish(&self, id: Uuid, status: JobStatus, error: Option<String>) {
        self.set_status(id, status, error).await;
        self.organize_guard
            .lock()
            .await
            .retain(|_, job_id| *job_id != id);
        self.prune_finished().await;
    }

    /// Evicts the oldest final records beyond `max_finished_jobs`.
    async fn prune_finished(&self) {
        let mut registry = self.registry.write().await;
        let mut finished: Vec<_> = registry
            .values()
            .filter(|r| r.status.is_final())
            .map(|r| (r.updated_at, r.id))
            .collect();
        let excess = finished.len().saturating_sub(self.config.max_finished_jobs);
        if excess == 0 {
            return;
        }

        finished.sort();
        for (_, id) in finished.into_iter().take(excess) {
            registry.remove(&id);
        }
        debug!(evicted = excess, "Pruned finished jobs");
    }

    async fn execute(&self, job: Job) -> Result<(), JobError> {
        match job {
            Job::DownloadMovie { movie_id } => {
                self.downloader()?.download_movie(movie_id).await?;
            }
            Job::DownloadSeason { season_id } => {
                self.downloader()?.download_season(season_id).await?;
            }
            Job::DownloadEpisode { episode_id } => {
                self.downloader()?.download_episode(episode_id).await?;
            }
            Job::DownloadMissing => {
                let enqueued = self.download_missing().await?;
                info!(enqueued, "Missing media sweep finished");
            }
            Job::Organize { media, strategy } => {
                self.organizer.organize(media, strategy).await?;
            }
            Job::RefreshTorrents => {
                let completed = self.refresh_torrents().await?;
                debug!(completed, "Torrent refresh finished");
            }
            Job::ScanLibrary => {
                self.scanner()?.scan_library().await?;
            }
            Job::FindNewEpisodes => {
                self.scanner()?.find_new_episodes().await?;
            }
        }
        Ok(())
    }

    fn downloader(&self) -> Result<&Arc<dyn Downloader>, JobError> {
        self.downloader
            .get()
            .ok_or(JobError::NotConfigured("downloader"))
    }

    fn scanner(&self) -> Result<&Arc<dyn LibraryScanner>, JobError> {
        self.scanner
            .get()
            .ok_or(JobError::NotConfigured("library scanner"))
    }

    /// Enqueues a download for every missing unit. Returns how many.
    async fn download_missing(&self) -> Result<usize, JobError> {
        self.downloader()?;
        let missing = self.store.list_missing()?;

        for &movie_id in &missing.movies {
            self.enqueue(Job::DownloadMovie { movie_id }).await?;
        }
        for &season_id in &missing.seasons {
            self.enqueue(Job::DownloadSeason { season_id }).await?;
        }
        for &episode_id in &missing.episodes {
            self.enqueue(Job::DownloadEpisode { episode_id }).await?;
        }

        Ok(missing.len())
    }

    /// Enqueues an organize job for every finished download. Returns how many.
    async fn refresh_torrents(&self) -> Result<usize, JobError> {
        let mut completed = 0;

        for torrent in self.store.list_torrents()? {
            if self.store.media_state(torrent.media)? != Some(MediaState::Downloading) {
                continue;
            }

            let info = match self.torrent_client.get_torrent(&torrent.hash).await {
                Ok(info) => info,
                Err(TorrentClientError::TorrentNotFound(_)) => {
                    warn!(hash = %torrent.hash, media = %torrent.media, "Torrent missing from client");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            debug!(hash = %torrent.hash, progress = info.progress, "Torrent progress");
            if info.is_complete() {
                self.enqueue_organize(torrent.media).await?;
                completed += 1;
            }
        }

        Ok(completed)
    }
}
