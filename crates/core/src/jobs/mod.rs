//! Job orchestrator.
//!
//! Named in-process queues for library work:
//! - **Download**: acquisition of missing movies, seasons and episodes
//! - **Organize**: placing finished downloads into the library
//! - **RefreshTorrents**: polling the torrent client for finished downloads
//! - **ScanLibrary**: library scans and new episode discovery
//!
//! Recurring jobs are fired by cron triggers.

mod collaborators;
mod config;
mod error;
mod runner;
mod schedule;
mod types;

pub use collaborators::{CollaboratorError, Downloader, LibraryScanner};
pub use config::JobsConfig;
pub use error::JobError;
pub use runner::{JobOrchestrator, ORGANIZE_STRATEGY_PARAM};
pub use types::{Job, JobHandle, JobQueue, JobRecord, JobStatus, JobsStatus};
