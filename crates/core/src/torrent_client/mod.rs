//! Torrent client abstraction.
//!
//! The organizer only needs to read a torrent's progress and file list and
//! to drop a torrent once its files were moved into the library.

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use types::*;
