//! Re-import feed: an RSS document whose enclosures point at the archived
//! files, so the archive can be subscribed to from a podcast player.

use rss::extension::itunes::{
    ITunesCategoryBuilder, ITunesChannelExtensionBuilder, ITunesItemExtensionBuilder,
};
use rss::{ChannelBuilder, EnclosureBuilder, GuidBuilder, ImageBuilder, Item, ItemBuilder};

use super::{ChannelMetadata, EpisodeRecord, FeedError};

/// One archived episode as it appears in the import feed.
#[derive(Debug, Clone)]
pub struct ImportEpisode<'a> {
    pub filename: &'a str,
    pub record: &'a EpisodeRecord,
    pub length: u64,
}

fn mime_for(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "m4a" | "aac" => "audio/mp4",
        "ogg" | "opus" => "audio/ogg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        _ => "audio/mpeg",
    }
}

fn local_href(base_url: Option<&str>, rel: &str) -> String {
    match base_url {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), rel),
        None => rel.to_string(),
    }
}

fn format_duration(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn item_for(ep: &ImportEpisode<'_>, base_url: Option<&str>) -> Item {
    let rec = ep.record;
    let enclosure = EnclosureBuilder::default()
        .url(local_href(base_url, &format!("episodes/{}", ep.filename)))
        .length(ep.length.to_string())
        .mime_type(mime_for(ep.filename).to_string())
        .build();
    let guid = GuidBuilder::default()
        .value(rec.guid.clone().unwrap_or_else(|| ep.filename.to_string()))
        .permalink(false)
        .build();
    let itunes = ITunesItemExtensionBuilder::default()
        .author(rec.author.clone())
        .subtitle(rec.subtitle.clone())
        .duration(rec.duration_secs.map(format_duration))
        .build();

    ItemBuilder::default()
        .title(Some(rec.title.clone()))
        .description(rec.description.clone())
        .link(rec.link.clone())
        .pub_date(rec.published.map(|d| d.to_rfc2822()))
        .enclosure(Some(enclosure))
        .guid(Some(guid))
        .itunes_ext(Some(itunes))
        .build()
}

/// Renders the import feed. `cover_file` is the artwork file name relative to
/// the show directory; `base_url` prefixes every local link when given.
pub fn build_import_feed(
    channel: &ChannelMetadata,
    cover_file: Option<&str>,
    episodes: &[ImportEpisode<'_>],
    base_url: Option<&str>,
) -> Result<Vec<u8>, FeedError> {
    let cover_href = cover_file.map(|c| local_href(base_url, c));
    let category = ITunesCategoryBuilder::default()
        .text(channel.category.clone())
        .build();
    let itunes = ITunesChannelExtensionBuilder::default()
        .author(channel.author.clone())
        .subtitle(channel.subtitle.clone())
        .explicit(channel.explicit.clone())
        .image(cover_href.clone())
        .categories(vec![category])
        .build();
    let image = cover_href.map(|href| {
        ImageBuilder::default()
            .url(href)
            .title(channel.title.clone())
            .link(channel.link.clone())
            .build()
    });

    let items: Vec<Item> = episodes.iter().map(|ep| item_for(ep, base_url)).collect();
    let rendered = ChannelBuilder::default()
        .title(channel.title.clone())
        .link(channel.link.clone())
        .description(channel.description.clone())
        .language(Some(channel.language.clone()))
        .copyright(channel.copyright.clone())
        .image(image)
        .itunes_ext(Some(itunes))
        .items(items)
        .build();

    rendered
        .pretty_write_to(Vec::new(), b' ', 2)
        .map_err(FeedError::Render)
}
