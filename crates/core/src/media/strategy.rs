//! File placement strategy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while resolving the organize strategy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error("unknown organize strategy: {0}")]
    Unknown(String),
}

/// How a downloaded file is placed into the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizeStrategy {
    /// Symbolic link from the library path to the download.
    Link,
    /// Move the download into the library, then drop the torrent.
    Move,
    /// Recursive copy, the download stays seeding.
    Copy,
}

impl OrganizeStrategy {
    /// Returns the string representation used in config and the params table.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizeStrategy::Link => "link",
            OrganizeStrategy::Move => "move",
            OrganizeStrategy::Copy => "copy",
        }
    }

    /// Whether the originating torrent is removed after placement.
    pub fn removes_torrent(&self) -> bool {
        matches!(self, OrganizeStrategy::Move)
    }
}

impl fmt::Display for OrganizeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrganizeStrategy {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "link" => Ok(OrganizeStrategy::Link),
            "move" => Ok(OrganizeStrategy::Move),
            "copy" => Ok(OrganizeStrategy::Copy),
            _ => Err(StrategyError::Unknown(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("LINK".parse::<OrganizeStrategy>(), Ok(OrganizeStrategy::Link));
        assert_eq!(" Move ".parse::<OrganizeStrategy>(), Ok(OrganizeStrategy::Move));
        assert_eq!("copy".parse::<OrganizeStrategy>(), Ok(OrganizeStrategy::Copy));
    }

    #[test]
    fn test_parse_unknown() {
        let err = "hardlink".parse::<OrganizeStrategy>().unwrap_err();
        assert_eq!(err, StrategyError::Unknown("hardlink".to_string()));
        assert_eq!(err.to_string(), "unknown organize strategy: hardlink");
    }

    #[test]
    fn test_only_move_removes_torrent() {
        assert!(OrganizeStrategy::Move.removes_torrent());
        assert!(!OrganizeStrategy::Link.removes_torrent());
        assert!(!OrganizeStrategy::Copy.removes_torrent());
    }

    #[test]
    fn test_serde_roundtrip_uses_snake_case() {
        let json = serde_json::to_string(&OrganizeStrategy::Copy).unwrap();
        assert_eq!(json, "\"copy\"");
        let parsed: OrganizeStrategy = serde_json::from_str("\"link\"").unwrap();
        assert_eq!(parsed, OrganizeStrategy::Link);
    }
}
