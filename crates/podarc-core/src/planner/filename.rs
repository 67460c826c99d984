//! `YYMMDD-<slug>.<ext>` file names.

use crate::feed::EpisodeRecord;

/// Date prefix used when an episode has no publish date.
pub const DATE_SENTINEL: &str = "000000";

const SLUG_MAX: usize = 80;
const FALLBACK_SLUG: &str = "untitled";
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "ogg", "opus", "wav", "flac"];
const DEFAULT_EXTENSION: &str = "mp3";

/// Candidate name for a record, before collision handling.
pub fn base_filename(rec: &EpisodeRecord, media_url: &str) -> String {
    format!(
        "{}-{}.{}",
        date_prefix(rec),
        slugify(&rec.title),
        extension_for_url(media_url)
    )
}

/// `YYMMDD` of the UTC publish date, or [`DATE_SENTINEL`].
pub fn date_prefix(rec: &EpisodeRecord) -> String {
    rec.published
        .map(|d| d.format("%y%m%d").to_string())
        .unwrap_or_else(|| DATE_SENTINEL.to_string())
}

/// Title → path-safe slug.
///
/// - Drops `<>:"/\|?*` and control characters
/// - Collapses whitespace runs to a single `-`
/// - Truncates to 80 bytes, backing off to the last `-` when one exists
/// - Empty result becomes `untitled`
pub fn slugify(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .map(|c| if c.is_control() && !c.is_whitespace() { '\0' } else { c })
        .filter(|c| *c != '\0')
        .collect();
    let mut slug = kept.split_whitespace().collect::<Vec<_>>().join("-");
    // Leading dots would make the file hidden.
    slug = slug.trim_start_matches('.').to_string();

    if slug.len() > SLUG_MAX {
        let mut take = SLUG_MAX;
        while !slug.is_char_boundary(take) {
            take -= 1;
        }
        let head = &slug[..take];
        slug = match head.rfind('-') {
            Some(i) if i > 0 => head[..i].to_string(),
            _ => head.to_string(),
        };
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Audio extension of the URL path (lowercased), or `mp3`.
pub fn extension_for_url(media_url: &str) -> &'static str {
    let Ok(parsed) = url::Url::parse(media_url) else {
        return DEFAULT_EXTENSION;
    };
    let Some(segment) = parsed.path().rsplit('/').find(|s| !s.is_empty()) else {
        return DEFAULT_EXTENSION;
    };
    let Some((_, ext)) = segment.rsplit_once('.') else {
        return DEFAULT_EXTENSION;
    };
    let ext = ext.to_ascii_lowercase();
    AUDIO_EXTENSIONS
        .iter()
        .copied()
        .find(|known| *known == ext)
        .unwrap_or(DEFAULT_EXTENSION)
}
