//! Trait definitions for the placer module.

use async_trait::async_trait;

use super::error::PlacerError;
use super::types::{PlacementJob, PlacementReport};

/// A placer that can put files into their library location.
#[async_trait]
pub trait Placer: Send + Sync {
    /// Returns the name of this placer implementation.
    fn name(&self) -> &str;

    /// Places files according to the job.
    ///
    /// Per-file failures are reported in the [`PlacementReport`]; `Err` is
    /// reserved for failures that prevent any placement, such as an
    /// uncreatable target directory.
    async fn place(&self, job: PlacementJob) -> Result<PlacementReport, PlacerError>;
}
