//! Tag values derived from feed data.

use std::sync::Arc;

use chrono::Datelike;

use crate::feed::{ChannelMetadata, EpisodeRecord};

/// Comments longer than this are cut (some players choke on huge COMM frames).
pub const COMMENT_MAX_CHARS: usize = 4000;

/// Everything the embedder writes for one episode.
#[derive(Debug, Clone, Default)]
pub struct EpisodeTags {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub track_number: Option<u32>,
    pub track_total: Option<u32>,
    pub year: Option<u32>,
    pub comment: Option<String>,
    pub guid: Option<String>,
    pub subtitle: Option<String>,
    /// Cover image bytes (JPEG or PNG), shared between jobs.
    pub artwork: Option<Arc<Vec<u8>>>,
}

impl EpisodeTags {
    pub fn minimal(title: &str, artist: &str, album: &str) -> Self {
        Self {
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            genre: "Podcast".to_string(),
            ..Self::default()
        }
    }

    pub fn for_episode(
        channel: &ChannelMetadata,
        episode: &EpisodeRecord,
        track_number: u32,
        track_total: u32,
        artwork: Option<Arc<Vec<u8>>>,
    ) -> Self {
        let comment = episode
            .description
            .as_deref()
            .map(strip_html)
            .map(|c| truncate_chars(&c, COMMENT_MAX_CHARS))
            .filter(|c| !c.is_empty());
        Self {
            title: episode.title.clone(),
            artist: episode
                .author
                .clone()
                .or_else(|| channel.author.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            album: channel.title.clone(),
            genre: channel.category.clone(),
            track_number: Some(track_number),
            track_total: Some(track_total),
            year: episode.published.map(|d| d.year() as u32),
            comment,
            guid: episode.guid.clone(),
            subtitle: episode.subtitle.clone(),
            artwork,
        }
    }

    /// `image/png` vs `image/jpeg`, sniffed from the bytes.
    pub fn artwork_is_png(&self) -> bool {
        self.artwork
            .as_deref()
            .map(|a| a.starts_with(b"\x89PNG"))
            .unwrap_or(false)
    }
}

/// Removes `<...>` markup and decodes the handful of entities feeds use.
pub fn strip_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn strips_markup_and_entities() {
        assert_eq!(
            strip_html("<p>Hello <b>world</b> &amp; friends</p>"),
            "Hello world & friends"
        );
        assert_eq!(strip_html("no tags"), "no tags");
    }

    #[test]
    fn for_episode_prefers_episode_author_and_cuts_comment() {
        let channel = ChannelMetadata {
            title: "Show".into(),
            author: Some("Network".into()),
            ..ChannelMetadata::default()
        };
        let mut ep = EpisodeRecord::new("Ep");
        ep.description = Some(format!("<p>{}</p>", "x".repeat(5000)));
        ep.published = Some(Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap());
        let tags = EpisodeTags::for_episode(&channel, &ep, 4, 10, None);
        assert_eq!(tags.artist, "Network");
        assert_eq!(tags.album, "Show");
        assert_eq!(tags.genre, "Podcast");
        assert_eq!(tags.year, Some(2021));
        assert_eq!((tags.track_number, tags.track_total), (Some(4), Some(10)));
        assert_eq!(tags.comment.as_ref().map(|c| c.chars().count()), Some(COMMENT_MAX_CHARS));

        ep.author = Some("Host".into());
        let tags = EpisodeTags::for_episode(&channel, &ep, 1, 1, None);
        assert_eq!(tags.artist, "Host");
    }

    #[test]
    fn artwork_sniffing() {
        let mut t = EpisodeTags::minimal("a", "b", "c");
        assert!(!t.artwork_is_png());
        t.artwork = Some(Arc::new(b"\x89PNG\r\n\x1a\n....".to_vec()));
        assert!(t.artwork_is_png());
        t.artwork = Some(Arc::new(vec![0xFF, 0xD8, 0xFF]));
        assert!(!t.artwork_is_png());
    }
}
