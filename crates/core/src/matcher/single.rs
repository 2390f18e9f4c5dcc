//! Movie and single-episode matching.

use tracing::debug;

use crate::torrent_client::TorrentFile;

use super::{basename, extension_of, is_allowed, FileRole, MatchedFile};

/// Selects the files to place for a movie or a single episode.
///
/// For each allowed extension the largest file wins (ties go to the later
/// file). Files with other extensions are returned as sidecars in input
/// order. No name is emitted twice.
pub fn match_single_media(files: &[TorrentFile], allowed: &[String]) -> Vec<MatchedFile> {
    let mut matched: Vec<MatchedFile> = Vec::new();

    for file in files {
        let extension = extension_of(&file.name);

        match extension {
            Some(ext) if is_allowed(ext, allowed) => {
                let largest = largest_with_extension(files, ext).unwrap_or(file);
                if matched.iter().any(|m| m.original == largest.name) {
                    continue;
                }
                let largest_ext = extension_of(&largest.name).unwrap_or(ext);
                debug!(file = %largest.name, size = largest.size_bytes, "Selected media file");
                matched.push(MatchedFile {
                    original: largest.name.clone(),
                    role: FileRole::Media {
                        extension: largest_ext.to_string(),
                    },
                });
            }
            _ => {
                if matched.iter().any(|m| m.original == file.name) {
                    continue;
                }
                matched.push(MatchedFile {
                    original: file.name.clone(),
                    role: FileRole::Sidecar {
                        file_name: basename(&file.name).to_string(),
                    },
                });
            }
        }
    }

    matched
}

fn largest_with_extension<'a>(files: &'a [TorrentFile], ext: &str) -> Option<&'a TorrentFile> {
    files
        .iter()
        .filter(|f| extension_of(&f.name).is_some_and(|e| e.eq_ignore_ascii_case(ext)))
        .fold(None, |best: Option<&TorrentFile>, f| match best {
            Some(b) if b.size_bytes > f.size_bytes => Some(b),
            _ => Some(f),
        })
}
