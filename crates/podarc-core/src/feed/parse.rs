//! RSS parsing via the `rss` crate.

use chrono::{DateTime, Utc};
use rss::{Channel, Item};

use super::{ChannelMetadata, EpisodeRecord, FeedError};

const DEFAULT_TITLE: &str = "Untitled";

/// Parses a feed document. Entries keep the feed's own order (newest-first
/// for virtually every podcast host).
pub fn parse_feed(bytes: &[u8]) -> Result<(ChannelMetadata, Vec<EpisodeRecord>), FeedError> {
    let channel = Channel::read_from(bytes)?;
    if channel.items().is_empty() {
        tracing::warn!(title = %channel.title(), "feed has no episodes");
    }
    let meta = channel_metadata(&channel);
    let episodes = channel.items().iter().map(episode_record).collect();
    Ok((meta, episodes))
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

fn channel_metadata(channel: &Channel) -> ChannelMetadata {
    let itunes = channel.itunes_ext();
    // iTunes artwork takes precedence over the plain RSS <image>.
    let image_url = itunes
        .and_then(|i| i.image())
        .and_then(non_empty)
        .or_else(|| channel.image().and_then(|img| non_empty(img.url())));
    let category = itunes
        .and_then(|i| i.categories().first())
        .and_then(|c| non_empty(c.text()))
        .unwrap_or_else(|| "Podcast".to_string());

    let defaults = ChannelMetadata::default();
    ChannelMetadata {
        title: non_empty(channel.title()).unwrap_or(defaults.title),
        description: channel.description().trim().to_string(),
        subtitle: itunes.and_then(|i| i.subtitle()).and_then(non_empty),
        author: itunes
            .and_then(|i| i.author())
            .and_then(non_empty)
            .or_else(|| channel.managing_editor().and_then(non_empty)),
        link: channel.link().trim().to_string(),
        image_url,
        language: channel
            .language()
            .and_then(non_empty)
            .unwrap_or(defaults.language),
        copyright: channel.copyright().and_then(non_empty),
        category,
        explicit: itunes.and_then(|i| i.explicit()).and_then(non_empty),
    }
}

/// RFC 2822 `pubDate`, falling back to a Dublin Core RFC 3339 date.
fn published_at(item: &Item) -> Option<DateTime<Utc>> {
    if let Some(pub_date) = item.pub_date() {
        if let Ok(dt) = DateTime::parse_from_rfc2822(pub_date.trim()) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    let dc = item.dublin_core_ext()?;
    let first = dc.dates().first()?;
    DateTime::parse_from_rfc3339(first.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn episode_record(item: &Item) -> EpisodeRecord {
    let itunes = item.itunes_ext();
    let enclosure = item.enclosure();
    EpisodeRecord {
        title: item
            .title()
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        published: published_at(item),
        media_url: enclosure.and_then(|e| non_empty(e.url())),
        media_type: enclosure.and_then(|e| non_empty(e.mime_type())),
        media_length: enclosure.and_then(|e| e.length().trim().parse::<u64>().ok()),
        artwork_url: itunes.and_then(|i| i.image()).and_then(non_empty),
        description: item
            .description()
            .and_then(non_empty)
            .or_else(|| itunes.and_then(|i| i.summary()).and_then(non_empty))
            .or_else(|| item.content().and_then(non_empty)),
        guid: item.guid().and_then(|g| non_empty(g.value())),
        author: itunes
            .and_then(|i| i.author())
            .and_then(non_empty)
            .or_else(|| item.author().and_then(non_empty)),
        subtitle: itunes.and_then(|i| i.subtitle()).and_then(non_empty),
        duration_secs: itunes.and_then(|i| i.duration()).and_then(parse_duration),
        link: item.link().and_then(non_empty),
    }
}

/// Parses an `itunes:duration`: plain seconds, `MM:SS` or `HH:MM:SS`.
pub fn parse_duration(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(secs);
    }
    let parts: Vec<u64> = raw
        .split(':')
        .map(|p| p.trim().parse::<u64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [h, m, s] => Some(h * 3600 + m * 60 + s),
        [m, s] => Some(m * 60 + s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
  <channel>
    <title>Night Owls</title>
    <link>https://owls.example.com</link>
    <description>Late-night talk.</description>
    <language>en-us</language>
    <itunes:author>Owl Media</itunes:author>
    <itunes:image href="https://owls.example.com/cover.png"/>
    <itunes:category text="Comedy"/>
    <item>
      <title>Second Flight</title>
      <guid>owl-2</guid>
      <pubDate>Tue, 02 Jan 2024 05:00:00 +0000</pubDate>
      <enclosure url="https://cdn.example.com/owl2.mp3" length="2048" type="audio/mpeg"/>
      <itunes:duration>01:02:03</itunes:duration>
      <description>Episode two.</description>
    </item>
    <item>
      <title>First Flight</title>
      <guid>owl-1</guid>
      <pubDate>not a date</pubDate>
      <enclosure url="https://cdn.example.com/owl1.m4a" length="oops" type="audio/x-m4a"/>
      <itunes:duration>95</itunes:duration>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_channel_metadata() {
        let (meta, _) = parse_feed(FEED.as_bytes()).unwrap();
        assert_eq!(meta.title, "Night Owls");
        assert_eq!(meta.author.as_deref(), Some("Owl Media"));
        assert_eq!(meta.image_url.as_deref(), Some("https://owls.example.com/cover.png"));
        assert_eq!(meta.category, "Comedy");
        assert_eq!(meta.language, "en-us");
    }

    #[test]
    fn parses_episodes_in_feed_order() {
        let (_, eps) = parse_feed(FEED.as_bytes()).unwrap();
        assert_eq!(eps.len(), 2);
        assert_eq!(eps[0].title, "Second Flight");
        assert_eq!(eps[0].guid.as_deref(), Some("owl-2"));
        assert_eq!(eps[0].media_length, Some(2048));
        assert_eq!(eps[0].duration_secs, Some(3723));
        let published = eps[0].published.unwrap();
        assert_eq!((published.year(), published.month(), published.day()), (2024, 1, 2));
        assert_eq!(published.hour(), 5);

        assert_eq!(eps[1].title, "First Flight");
        assert!(eps[1].published.is_none(), "unparsable date is dropped");
        assert!(eps[1].media_length.is_none());
        assert_eq!(eps[1].duration_secs, Some(95));
        assert_eq!(eps[1].media_url.as_deref(), Some("https://cdn.example.com/owl1.m4a"));
    }

    #[test]
    fn malformed_feed_is_error() {
        assert!(matches!(
            parse_feed(b"<html><body>not a feed</body></html>"),
            Err(FeedError::Malformed(_))
        ));
    }

    #[test]
    fn feed_without_items_has_no_episodes() {
        let xml = r#"<rss version="2.0"><channel><title>Quiet Show</title><link>l</link><description>d</description></channel></rss>"#;
        let (meta, episodes) = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(meta.title, "Quiet Show");
        assert!(episodes.is_empty());
    }

    #[test]
    fn duration_formats() {
        assert_eq!(parse_duration("3600"), Some(3600));
        assert_eq!(parse_duration("12:34"), Some(754));
        assert_eq!(parse_duration("1:00:00"), Some(3600));
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration(""), None);
    }
}
