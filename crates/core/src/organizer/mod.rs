//! Organize jobs: from a completed torrent to library files and state.
//!
//! [`Organizer::organize`] loads the media unit and its torrent, matches
//! the torrent's files, names and places them, removes the torrent when
//! the strategy moves data, then commits the [`reconcile`] plan in one
//! store transaction.

mod error;
mod organize;
pub mod reconcile;

pub use error::OrganizeError;
pub use organize::{OrganizeSummary, Organizer};
