//! Library naming rules.
//!
//! Pure string building: folder names and file stems for movies and
//! episodes. Callers append the extension with [`file_name`].

use std::path::PathBuf;

const UNKNOWN: &str = "unknown";

/// Folder name for a title with nothing usable left after sanitizing.
const UNTITLED: &str = "untitled";

/// Replaces path separators and strips leading dots so a title can
/// neither escape its folder nor resolve to `.`/`..`.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').trim_start();
    if cleaned.is_empty() {
        UNTITLED.to_string()
    } else {
        cleaned.to_string()
    }
}

/// `"{title} ({year})"`, or the bare title when the year is unknown.
pub fn movie_folder(title: &str, year: Option<i32>) -> String {
    let title = sanitize_title(title);
    match year {
        Some(year) => format!("{} ({})", title, year),
        None => title,
    }
}

/// Movie file stem: folder, quality and tag separated by spaces.
///
/// Segments equal to `unknown` are left out.
pub fn movie_file_stem(folder: &str, quality: &str, tag: &str) -> String {
    let tag = tag.to_uppercase();
    [folder, quality, tag.as_str()]
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case(UNKNOWN))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Episode file stem, e.g. `Foo - S01E05 - Part 2 - 720p [ABC]`.
pub fn episode_file_stem(
    show: &str,
    season: u32,
    episode: u32,
    part: Option<u32>,
    quality: &str,
    tag: &str,
) -> String {
    let mut segments = vec![
        sanitize_title(show),
        format!("S{:02}E{:02}", season, episode),
    ];
    if let Some(part) = part {
        segments.push(format!("Part {}", part));
    }
    segments.push(format!("{} [{}]", quality, tag.to_uppercase()));
    segments.join(" - ")
}

/// Season directory relative to the TV shows root.
pub fn season_folder(show: &str, season: u32) -> PathBuf {
    PathBuf::from(sanitize_title(show)).join(format!("Season {:02}", season))
}

pub fn file_name(stem: &str, extension: &str) -> String {
    format!("{}.{}", stem, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_folder() {
        assert_eq!(movie_folder("Dune", Some(2021)), "Dune (2021)");
        assert_eq!(movie_folder("Dune", None), "Dune");
    }

    #[test]
    fn test_movie_file_stem_drops_unknown() {
        let folder = movie_folder("Dune", Some(2021));
        assert_eq!(movie_file_stem(&folder, "1080p", "unknown"), "Dune (2021) 1080p");
        assert_eq!(
            movie_file_stem(&folder, "unknown", "yts"),
            "Dune (2021) YTS"
        );
        assert_eq!(
            movie_file_stem(&folder, "2160p", "rarbg"),
            "Dune (2021) 2160p RARBG"
        );
    }

    #[test]
    fn test_episode_file_stem() {
        assert_eq!(
            episode_file_stem("Foo", 1, 5, None, "720p", "abc"),
            "Foo - S01E05 - 720p [ABC]"
        );
        assert_eq!(
            episode_file_stem("Foo", 1, 5, Some(2), "720p", "abc"),
            "Foo - S01E05 - Part 2 - 720p [ABC]"
        );
    }

    #[test]
    fn test_episode_numbers_widen() {
        assert_eq!(
            episode_file_stem("Foo", 12, 105, None, "1080p", "x"),
            "Foo - S12E105 - 1080p [X]"
        );
    }

    #[test]
    fn test_season_folder() {
        assert_eq!(season_folder("Foo", 3), PathBuf::from("Foo/Season 03"));
        assert_eq!(season_folder("Foo", 12), PathBuf::from("Foo/Season 12"));
    }

    #[test]
    fn test_titles_cannot_escape_folder() {
        assert_eq!(movie_folder("AC/DC: Live", Some(1991)), "AC DC: Live (1991)");
        assert_eq!(season_folder("../etc", 1), PathBuf::from("etc/Season 01"));
    }

    #[test]
    fn test_dot_only_titles_stay_inside_root() {
        assert_eq!(movie_folder("..", None), "untitled");
        assert_eq!(movie_folder(".", Some(2001)), "untitled (2001)");
        assert_eq!(season_folder("..", 1), PathBuf::from("untitled/Season 01"));
        assert_eq!(movie_folder("  ", None), "untitled");
        assert_eq!(movie_folder(".hack", None), "hack");
        assert_eq!(movie_folder("Mr. Robot", None), "Mr. Robot");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("Dune (2021) 1080p", "mkv"), "Dune (2021) 1080p.mkv");
    }
}
