//! Parser for the provider encoded episode blob.
//!
//! Grammar: play groups separated by `$$$`, episodes separated by `#`, each
//! episode written as `name$url`. Providers are sloppy, so bad segments are
//! skipped instead of failing the whole video.

use crate::formats::EpisodeCandidate;
use crate::probe::{is_manifest_url, is_valid_url_format};

const GROUP_SEPARATOR: &str = "$$$";
const EPISODE_SEPARATOR: char = '#';
const NAME_URL_SEPARATOR: char = '$';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistParse {
    Complete(Vec<EpisodeCandidate>),
    Partial {
        episodes: Vec<EpisodeCandidate>,
        skipped: usize,
    },
    Empty,
}

impl PlaylistParse {
    pub fn episodes(&self) -> &[EpisodeCandidate] {
        match self {
            Self::Complete(episodes) | Self::Partial { episodes, .. } => episodes,
            Self::Empty => &[],
        }
    }

    pub fn into_episodes(self) -> Vec<EpisodeCandidate> {
        match self {
            Self::Complete(episodes) | Self::Partial { episodes, .. } => episodes,
            Self::Empty => Vec::new(),
        }
    }

    pub fn skipped(&self) -> usize {
        match self {
            Self::Partial { skipped, .. } => *skipped,
            _ => 0,
        }
    }
}

/// Parses the preferred play group of `blob` into indexed episodes.
pub fn parse_play_url(blob: &str) -> PlaylistParse {
    let Some(group) = select_group(blob) else {
        return PlaylistParse::Empty;
    };

    let mut episodes = Vec::new();
    let mut skipped = 0_usize;
    for segment in segments(group) {
        match parse_segment(segment, episodes.len()) {
            Some(ep) => episodes.push(ep),
            None => skipped += 1,
        }
    }

    match (episodes.is_empty(), skipped) {
        (true, _) => PlaylistParse::Empty,
        (false, 0) => PlaylistParse::Complete(episodes),
        (false, skipped) => PlaylistParse::Partial { episodes, skipped },
    }
}

/// First syntactically valid url anywhere in the blob.
pub fn first_playable_url(blob: &str) -> Option<String> {
    blob.split(GROUP_SEPARATOR)
        .flat_map(segments)
        .filter_map(|segment| split_segment(segment).map(|(_, url)| url))
        .find(|url| is_valid_url_format(url))
        .map(str::to_owned)
}

fn segments(group: &str) -> impl Iterator<Item = &str> {
    group
        .split(EPISODE_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Prefers the first group carrying an HLS manifest, else the first non-empty one.
fn select_group(blob: &str) -> Option<&str> {
    let groups = blob
        .split(GROUP_SEPARATOR)
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .collect::<Vec<_>>();

    groups
        .iter()
        .find(|g| {
            segments(g)
                .filter_map(split_segment)
                .any(|(_, url)| is_manifest_url(url))
        })
        .or_else(|| groups.first())
        .copied()
}

fn split_segment(segment: &str) -> Option<(Option<&str>, &str)> {
    match segment.split_once(NAME_URL_SEPARATOR) {
        Some((name, url)) => {
            let url = url.trim();
            if url.is_empty() {
                return None;
            }
            let name = name.trim();
            Some(((!name.is_empty()).then_some(name), url))
        }
        None => Some((None, segment.trim())),
    }
}

fn parse_segment(segment: &str, index: usize) -> Option<EpisodeCandidate> {
    let (name, url) = split_segment(segment)?;
    // A bare segment only counts when it actually looks like a url.
    if name.is_none() && !segment.contains(NAME_URL_SEPARATOR) && !is_valid_url_format(url) {
        return None;
    }
    Some(EpisodeCandidate {
        index,
        name: name
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Episode {}", index + 1)),
        url: url.to_owned(),
    })
}
