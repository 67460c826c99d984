//! [`MetadataEmbedder`] backed by the `lofty` tag library.

use std::path::Path;

use lofty::config::WriteOptions;
use lofty::error::{ErrorKind, LoftyError};
use lofty::id3::v2::Id3v2Tag;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{Tag, TagType};

use super::{EmbedError, EpisodeTags, MetadataEmbedder};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyEmbedder;

fn map_lofty(e: LoftyError) -> EmbedError {
    let msg = e.to_string();
    match e.kind() {
        ErrorKind::Io(io) => EmbedError::Io(std::io::Error::new(io.kind(), msg)),
        ErrorKind::FileDecoding(_)
        | ErrorKind::SizeMismatch
        | ErrorKind::TooMuchData
        | ErrorKind::Id3v2(_)
        | ErrorKind::FakeTag => EmbedError::PartialCorruption(msg),
        ErrorKind::UnknownFormat | ErrorKind::UnsupportedTag => EmbedError::Unsupported(msg),
        _ => EmbedError::Failed(msg),
    }
}

fn cover(tags: &EpisodeTags) -> Option<Picture> {
    let data = tags.artwork.as_deref()?;
    let mime = if tags.artwork_is_png() {
        MimeType::Png
    } else {
        MimeType::Jpeg
    };
    Some(Picture::new_unchecked(
        PictureType::CoverFront,
        Some(mime),
        Some("Cover".to_string()),
        data.clone(),
    ))
}

/// Title, artist, album, genre, track and year: the fields every tier writes.
fn apply_core(tag: &mut Tag, tags: &EpisodeTags) {
    tag.set_title(tags.title.clone());
    tag.set_artist(tags.artist.clone());
    tag.set_album(tags.album.clone());
    tag.set_genre(tags.genre.clone());
    if let Some(n) = tags.track_number {
        tag.set_track(n);
    }
    if let Some(total) = tags.track_total {
        tag.set_track_total(total);
    }
    if let Some(year) = tags.year {
        tag.set_year(year);
    }
}

/// Everything the full tier writes: core fields plus comment, GUID, subtitle and cover.
fn apply_full(tag: &mut Tag, tags: &EpisodeTags) {
    apply_core(tag, tags);
    if let Some(comment) = &tags.comment {
        tag.set_comment(comment.clone());
    }
    if let Some(guid) = &tags.guid {
        tag.insert_text(ItemKey::PodcastGlobalUniqueId, guid.clone());
    }
    if let Some(subtitle) = &tags.subtitle {
        tag.insert_text(ItemKey::TrackSubtitle, subtitle.clone());
    }
    if let Some(picture) = cover(tags) {
        tag.remove_picture_type(PictureType::CoverFront);
        tag.push_picture(picture);
    }
}

impl MetadataEmbedder for LoftyEmbedder {
    fn embed_full(&self, path: &Path, tags: &EpisodeTags) -> Result<(), EmbedError> {
        // Archive temp files carry a `.tmp` suffix, so detect the format from content.
        let mut file = Probe::open(path)
            .map_err(map_lofty)?
            .guess_file_type()?
            .read()
            .map_err(map_lofty)?;
        let tag_type = file.primary_tag_type();
        if file.tag(tag_type).is_none() {
            file.insert_tag(Tag::new(tag_type));
        }
        let tag = file
            .tag_mut(tag_type)
            .ok_or_else(|| EmbedError::Failed(format!("no writable {:?} tag", tag_type)))?;

        apply_full(tag, tags);

        file.save_to_path(path, WriteOptions::default())
            .map_err(map_lofty)
    }

    fn embed_simple(&self, path: &Path, tags: &EpisodeTags) -> Result<bool, EmbedError> {
        let mut core = Tag::new(TagType::Id3v2);
        apply_core(&mut core, tags);
        let id3: Id3v2Tag = core.into();
        id3.save_to_path(path, WriteOptions::default())
            .map_err(map_lofty)?;

        let Some(picture) = cover(tags) else {
            return Ok(false);
        };
        let added = (|| -> Result<(), LoftyError> {
            let mut file = Probe::open(path)?.guess_file_type()?.read()?;
            let Some(tag) = file.tag_mut(TagType::Id3v2) else {
                return Ok(());
            };
            tag.remove_picture_type(PictureType::CoverFront);
            tag.push_picture(picture);
            file.save_to_path(path, WriteOptions::default())
        })();
        match added {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cover not added in simple tier");
                Ok(false)
            }
        }
    }
}
