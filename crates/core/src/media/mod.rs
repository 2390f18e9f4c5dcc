//! Library data model.
//!
//! Media units (movies, seasons, episodes), the torrents attached to them
//! and the file records written once their files land in the library.

mod strategy;
mod types;

pub use strategy::{OrganizeStrategy, StrategyError};
pub use types::*;
