//! Placer module for putting downloaded files into the library.
//!
//! The `Placer` trait takes a [`PlacementJob`] (a target directory, a
//! strategy and a list of files) and reports per-file outcomes.
//!
//! # Strategies
//!
//! - `Link`: symbolic link pointing at the download, which keeps seeding
//! - `Move`: rename, with a copy + remove fallback across filesystems
//! - `Copy`: recursive copy
//!
//! Placement is sequential and stops at the first failure. Files placed
//! before the failure stay where they are; the [`PlacementReport`] says
//! which ones.
//!
//! # Example
//!
//! ```ignore
//! use reelkeeper_core::placer::{FsPlacer, Placer, PlacementJob, FilePlacement};
//!
//! let placer = FsPlacer::new();
//! let job = PlacementJob {
//!     job_id: "job-1".to_string(),
//!     target_dir: PathBuf::from("/library/movies/Dune (2021)"),
//!     strategy: OrganizeStrategy::Link,
//!     files: vec![FilePlacement {
//!         item_id: "movie:1".to_string(),
//!         source: PathBuf::from("/downloads/complete/Dune/Dune.2021.mkv"),
//!         file_name: "Dune (2021) 1080p.mkv".to_string(),
//!     }],
//! };
//!
//! let report = placer.place(job).await?.into_result()?;
//! println!("Placed {} files ({} bytes)", report.placed_count(), report.total_bytes());
//! ```

mod error;
mod fs_placer;
mod traits;
mod types;

pub use error::PlacerError;
pub use fs_placer::FsPlacer;
pub use traits::Placer;
pub use types::{FileOutcome, FilePlacement, FileReport, PlacementJob, PlacementReport};
