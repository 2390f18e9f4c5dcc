//! Organizer implementation.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::LibraryConfig;
use crate::matcher::{match_season_batch, match_single_media, FileRole, MatchedFile};
use crate::media::{MediaRef, MediaState, OrganizeStrategy, TorrentRecord};
use crate::metrics;
use crate::naming;
use crate::placer::{FilePlacement, PlacementJob, PlacementReport, Placer};
use crate::store::{LibraryStore, LibraryUpdate, StoreError};
use crate::torrent_client::TorrentClient;

use super::reconcile::{self, PlacedFile};
use super::OrganizeError;

/// Outcome of a successful organize job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizeSummary {
    pub media: MediaRef,
    pub strategy: OrganizeStrategy,
    pub files_placed: usize,
    /// Units moved to PROCESSED.
    pub processed: usize,
    /// Season episodes moved to MISSING.
    pub missing: usize,
    pub torrent_removed: bool,
}

/// What the placer should do for one media unit.
struct Plan {
    target_dir: PathBuf,
    placements: Vec<FilePlacement>,
}

/// Runs organize jobs against the library.
pub struct Organizer {
    store: Arc<dyn LibraryStore>,
    torrent_client: Arc<dyn TorrentClient>,
    placer: Arc<dyn Placer>,
    library: LibraryConfig,
}

impl Organizer {
    pub fn new(
        store: Arc<dyn LibraryStore>,
        torrent_client: Arc<dyn TorrentClient>,
        placer: Arc<dyn Placer>,
        library: LibraryConfig,
    ) -> Self {
        Self {
            store,
            torrent_client,
            placer,
            library,
        }
    }

    pub fn library(&self) -> &LibraryConfig {
        &self.library
    }

    /// Organizes the downloaded files of one media unit.
    pub async fn organize(
        &self,
        media: MediaRef,
        strategy: OrganizeStrategy,
    ) -> Result<OrganizeSummary, OrganizeError> {
        info!(%media, %strategy, "Organizing media");

        let torrent = self
            .store
            .torrent_for(media)?
            .ok_or(OrganizeError::TorrentNotFound(media))?;
        let files = self.torrent_client.get_files(&torrent.hash).await?;
        let allowed = &self.library.allowed_extensions;

        let update = match media {
            MediaRef::Movie(id) => {
                let movie = self
                    .store
                    .get_movie(id)?
                    .ok_or_else(|| StoreError::not_found(media))?;

                let matched = match_single_media(&files, allowed);
                let folder = naming::movie_folder(&movie.title, movie.year());
                let stem = naming::movie_file_stem(&folder, &torrent.quality, &torrent.tag);
                let plan = Plan {
                    target_dir: self.library.movies_dir().join(&folder),
                    placements: self.single_placements(&matched, &stem),
                };

                let placed = self.place(media, strategy, plan).await?;
                reconcile::plan_movie(id, torrent.id, strategy, &placed)
            }
            MediaRef::Episode(id) => {
                let ctx = self
                    .store
                    .get_episode(id)?
                    .ok_or_else(|| StoreError::not_found(media))?;

                let matched = match_single_media(&files, allowed);
                let stem = naming::episode_file_stem(
                    &ctx.show.title,
                    ctx.season.season_number,
                    ctx.episode.episode_number,
                    None,
                    &torrent.quality,
                    &torrent.tag,
                );
                let plan = Plan {
                    target_dir: self
                        .library
                        .tv_shows_dir()
                        .join(naming::season_folder(&ctx.show.title, ctx.season.season_number)),
                    placements: self.single_placements(&matched, &stem),
                };

                let placed = self.place(media, strategy, plan).await?;
                reconcile::plan_episode(id, torrent.id, strategy, &placed)
            }
            MediaRef::Season(id) => {
                let season = self
                    .store
                    .get_season(id)?
                    .ok_or_else(|| StoreError::not_found(media))?;

                let matched = match_season_batch(&files, allowed)?;
                let season_number = season.season.season_number;
                let placements = matched
                    .iter()
                    .map(|file| {
                        let stem = naming::episode_file_stem(
                            &season.show.title,
                            season_number,
                            file.episode,
                            file.part,
                            &torrent.quality,
                            &torrent.tag,
                        );
                        self.placement(&file.original, naming::file_name(&stem, &file.extension))
                    })
                    .collect();
                let plan = Plan {
                    target_dir: self
                        .library
                        .tv_shows_dir()
                        .join(naming::season_folder(&season.show.title, season_number)),
                    placements,
                };

                let placed = self.place(media, strategy, plan).await?;
                reconcile::plan_season(&season, torrent.id, strategy, &matched, &placed)
            }
        };

        let torrent_removed = self.remove_torrent_if_moved(&torrent, strategy).await?;
        self.store.commit_update(&update)?;

        let summary = OrganizeSummary {
            media,
            strategy,
            files_placed: update.new_files.len(),
            processed: update.count_state(MediaState::Processed),
            missing: update.count_state(MediaState::Missing),
            torrent_removed,
        };
        record_metrics(&update, strategy);

        info!(
            %media,
            %strategy,
            files_placed = summary.files_placed,
            processed = summary.processed,
            missing = summary.missing,
            torrent_removed,
            "Organize finished"
        );
        Ok(summary)
    }

    fn placement(&self, original: &str, file_name: String) -> FilePlacement {
        FilePlacement {
            item_id: original.to_string(),
            source: self.library.downloads_dir().join(original),
            file_name,
        }
    }

    /// Media files get the library name, sidecars keep theirs.
    fn single_placements(&self, matched: &[MatchedFile], stem: &str) -> Vec<FilePlacement> {
        matched
            .iter()
            .map(|file| {
                let file_name = match &file.role {
                    FileRole::Media { extension } => naming::file_name(stem, extension),
                    FileRole::Sidecar { file_name } => file_name.clone(),
                };
                self.placement(&file.original, file_name)
            })
            .collect()
    }

    async fn place(
        &self,
        media: MediaRef,
        strategy: OrganizeStrategy,
        plan: Plan,
    ) -> Result<Vec<PlacedFile>, OrganizeError> {
        if plan.placements.is_empty() {
            warn!(%media, "Torrent has no files to place");
        }

        let job = PlacementJob {
            job_id: format!("organize-{}", media),
            target_dir: plan.target_dir,
            strategy,
            files: plan.placements,
        };
        let report: PlacementReport = self.placer.place(job).await?.into_result()?;

        Ok(report
            .placed()
            .map(|(original, destination)| PlacedFile {
                original: original.to_string(),
                destination: destination.clone(),
            })
            .collect())
    }

    async fn remove_torrent_if_moved(
        &self,
        torrent: &TorrentRecord,
        strategy: OrganizeStrategy,
    ) -> Result<bool, OrganizeError> {
        if !strategy.removes_torrent() {
            return Ok(false);
        }
        self.torrent_client
            .remove_torrent(&torrent.hash, true)
            .await?;
        info!(hash = %torrent.hash, media = %torrent.media, "Removed torrent and data");
        Ok(true)
    }
}

fn record_metrics(update: &LibraryUpdate, strategy: OrganizeStrategy) {
    metrics::FILES_PLACED
        .with_label_values(&[strategy.as_str()])
        .inc_by(update.new_files.len() as u64);
    for change in &update.state_changes {
        metrics::MEDIA_STATE_CHANGES
            .with_label_values(&[change.state.as_str()])
            .inc();
    }
}
