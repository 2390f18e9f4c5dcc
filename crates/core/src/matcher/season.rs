//! Season batch matching.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::{debug, error};

use crate::torrent_client::TorrentFile;

use super::{basename, extension_of, is_allowed, MatchError, SeasonFile};

/// Season/episode markers, tried in order against the upper-cased basename.
static EPISODE_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"S(\d+) ?E(\d+)").unwrap(),
        Regex::new(r"(\d+)X(\d+)").unwrap(),
    ]
});

static PART_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)part ?(\d+)").unwrap());

/// Extracts season and episode numbers from a file name.
fn parse_episode(name: &str) -> Option<(Option<u32>, u32)> {
    let upper = basename(name).to_uppercase();
    EPISODE_PATTERNS.iter().find_map(|re| {
        let caps = re.captures(&upper)?;
        let episode = caps.get(2)?.as_str().parse().ok()?;
        let season = caps.get(1).and_then(|m| m.as_str().parse().ok());
        Some((season, episode))
    })
}

fn parse_part(name: &str) -> Option<u32> {
    PART_PATTERN
        .captures(basename(name))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Matches every episode file of a season torrent.
///
/// Files without an allowed extension or without an episode marker are
/// dropped. When several files carry the same episode (and part), the
/// first one in input order wins.
pub fn match_season_batch(
    files: &[TorrentFile],
    allowed: &[String],
) -> Result<Vec<SeasonFile>, MatchError> {
    let mut matched: Vec<SeasonFile> = Vec::new();

    for file in files {
        let Some(extension) = extension_of(&file.name).filter(|e| is_allowed(e, allowed)) else {
            continue;
        };
        let Some((season, episode)) = parse_episode(&file.name) else {
            debug!(file = %file.name, "No episode marker, skipping");
            continue;
        };
        let part = parse_part(&file.name);
        if let Some(kept) = matched
            .iter()
            .find(|m| m.episode == episode && m.part == part)
        {
            debug!(
                file = %file.name,
                kept = %kept.original,
                episode,
                "Duplicate episode, keeping first match"
            );
            continue;
        }

        matched.push(SeasonFile {
            original: file.name.clone(),
            extension: extension.to_string(),
            season,
            episode,
            part,
        });
    }

    if matched.is_empty() {
        let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        error!(files = ?names, "No matchable files in season torrent");
        return Err(MatchError::NoMatchableFiles { files: names });
    }

    Ok(matched)
}
