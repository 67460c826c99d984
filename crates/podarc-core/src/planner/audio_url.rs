//! Heuristic check that an enclosure URL points at audio rather than a page.

/// Result of [`is_likely_audio_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlCheck {
    Ok,
    Rejected(&'static str),
}

impl UrlCheck {
    pub fn is_ok(&self) -> bool {
        matches!(self, UrlCheck::Ok)
    }
}

const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".m4a", ".aac", ".ogg", ".wav", ".flac", ".opus"];

const SUSPICIOUS: &[(&str, &str)] = &[
    ("media.php", "URL appears to be a PHP page, not an audio file"),
    ("pageID=", "URL appears to be a webpage with page ID"),
    (".html", "URL appears to be an HTML page"),
    (".htm", "URL appears to be an HTML page"),
    ("view=", "URL appears to be a webpage view"),
];

/// Rejects URLs that look like web pages. Extension-less URLs pass, since
/// plenty of CDNs serve audio without one.
pub fn is_likely_audio_url(url: &str) -> UrlCheck {
    if url.trim().is_empty() {
        return UrlCheck::Rejected("no URL provided");
    }
    if url::Url::parse(url).is_err() {
        return UrlCheck::Rejected("URL cannot be parsed");
    }
    for (pattern, reason) in SUSPICIOUS {
        if url.contains(pattern) {
            return UrlCheck::Rejected(reason);
        }
    }
    let lower = url.to_ascii_lowercase();
    let has_audio_ext = AUDIO_EXTENSIONS.iter().any(|ext| lower.contains(ext));
    let last = url.rsplit('/').next().unwrap_or("");
    if !has_audio_ext && last.contains('.') {
        return UrlCheck::Rejected("URL doesn't appear to have an audio file extension");
    }
    UrlCheck::Ok
}
