//! Filename matching for completed downloads.
//!
//! Two pure entry points decide which files of a torrent end up in the
//! library:
//!
//! - [`match_single_media`] for a movie or a single episode: the largest file
//!   of each allowed extension is the media file, everything else rides
//!   along as a sidecar (subtitles, nfo, artwork).
//! - [`match_season_batch`] for a whole season: every allowed file whose
//!   name carries a season/episode marker (`S01E02`, `1x02`) is kept.
//!
//! Neither function touches the filesystem.

mod season;
mod single;
mod types;

pub use season::match_season_batch;
pub use single::match_single_media;
pub use types::{FileRole, MatchError, MatchedFile, SeasonFile};

/// Extension of the last path segment, without the dot.
pub(crate) fn extension_of(name: &str) -> Option<&str> {
    let base = basename(name);
    match base.rfind('.') {
        Some(idx) if idx + 1 < base.len() => Some(&base[idx + 1..]),
        _ => None,
    }
}

/// Last `/`-separated segment of a torrent file name.
pub(crate) fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

pub(crate) fn is_allowed(extension: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|a| a.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Dune/Dune.2021.mkv"), Some("mkv"));
        assert_eq!(extension_of("Dune.2021.MKV"), Some("MKV"));
        assert_eq!(extension_of("folder.d/README"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("a/b/c.srt"), "c.srt");
        assert_eq!(basename("c.srt"), "c.srt");
    }

    #[test]
    fn test_is_allowed_ignores_case() {
        let allowed = vec!["mkv".to_string(), "mp4".to_string()];
        assert!(is_allowed("MKV", &allowed));
        assert!(is_allowed("mp4", &allowed));
        assert!(!is_allowed("srt", &allowed));
    }
}
