//! Archive verification and offline repair.
//!
//! Verification compares the manifest with the `episodes/` directory and
//! classifies every entry. Repair only fixes what can be fixed locally:
//! missing tags are re-embedded from `show.json`, leftover temp files are
//! removed. Nothing here touches the network.

mod probe;
mod repair;

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::archive::ArchiveLayout;
use crate::atomic::is_temp_name;
use crate::manifest::ManifestStore;

pub use probe::{looks_like_audio, probe_audio};
pub use repair::{repair, RepairOptions, RepairReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosisKind {
    Ok,
    MissingFile,
    UnreadableFile { reason: String },
    MetadataMissing,
    /// File in `episodes/` with no manifest entry.
    Orphan,
    /// Temp file left by an interrupted write.
    StaleTemp { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub filename: String,
    pub kind: DiagnosisKind,
}

impl Diagnosis {
    fn new(filename: impl Into<String>, kind: DiagnosisKind) -> Self {
        Self {
            filename: filename.into(),
            kind,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.kind == DiagnosisKind::Ok
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosisKind::Ok => write!(f, "OK        {}", self.filename),
            DiagnosisKind::MissingFile => write!(f, "MISSING   {}", self.filename),
            DiagnosisKind::UnreadableFile { reason } => {
                write!(f, "CORRUPT   {} ({})", self.filename, reason)
            }
            DiagnosisKind::MetadataMissing => write!(f, "NO TAGS   {}", self.filename),
            DiagnosisKind::Orphan => write!(f, "UNTRACKED {}", self.filename),
            DiagnosisKind::StaleTemp { path } => write!(f, "STALE TMP {}", path.display()),
        }
    }
}

/// Tallies per kind, for the summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifySummary {
    pub ok: usize,
    pub missing: usize,
    pub unreadable: usize,
    pub metadata_missing: usize,
    pub orphans: usize,
    pub stale_temps: usize,
}

impl VerifySummary {
    pub fn from_diagnoses(diagnoses: &[Diagnosis]) -> Self {
        let mut s = Self::default();
        for d in diagnoses {
            match d.kind {
                DiagnosisKind::Ok => s.ok += 1,
                DiagnosisKind::MissingFile => s.missing += 1,
                DiagnosisKind::UnreadableFile { .. } => s.unreadable += 1,
                DiagnosisKind::MetadataMissing => s.metadata_missing += 1,
                DiagnosisKind::Orphan => s.orphans += 1,
                DiagnosisKind::StaleTemp { .. } => s.stale_temps += 1,
            }
        }
        s
    }

    pub fn is_clean(&self) -> bool {
        self.missing + self.unreadable + self.metadata_missing + self.orphans + self.stale_temps
            == 0
    }
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = rd
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}

/// Classifies every manifest entry (in manifest order), then untracked files
/// and stale temp files (sorted by name).
pub fn verify(layout: &ArchiveLayout, manifest: &ManifestStore) -> Vec<Diagnosis> {
    let mut out = Vec::new();
    for entry in manifest.entries() {
        let path = layout.episode_path(&entry.filename);
        let kind = if !path.exists() {
            DiagnosisKind::MissingFile
        } else {
            match probe_audio(&path) {
                Err(reason) => DiagnosisKind::UnreadableFile { reason },
                // An untagged entry whose size drifted was retagged without the
                // manifest catching up; tagging it again settles both.
                Ok(len) if len != entry.content_length && !entry.metadata_embedded => {
                    DiagnosisKind::MetadataMissing
                }
                Ok(len) if len != entry.content_length => DiagnosisKind::UnreadableFile {
                    reason: format!(
                        "size {} differs from recorded {}",
                        len, entry.content_length
                    ),
                },
                Ok(_) if !entry.metadata_embedded => DiagnosisKind::MetadataMissing,
                Ok(_) => DiagnosisKind::Ok,
            }
        };
        out.push(Diagnosis::new(entry.filename.clone(), kind));
    }

    let episodes_dir = layout.episodes_dir();
    let mut temps = Vec::new();
    for name in sorted_names(&episodes_dir) {
        if is_temp_name(&name) {
            temps.push(Diagnosis::new(
                name.clone(),
                DiagnosisKind::StaleTemp {
                    path: episodes_dir.join(&name),
                },
            ));
        } else if !manifest.contains(&name) {
            out.push(Diagnosis::new(name, DiagnosisKind::Orphan));
        }
    }
    for name in sorted_names(layout.root()) {
        if is_temp_name(&name) {
            temps.push(Diagnosis::new(
                name.clone(),
                DiagnosisKind::StaleTemp {
                    path: layout.root().join(&name),
                },
            ));
        }
    }
    out.extend(temps);
    out
}

/// Stamps `last_verified` on every entry diagnosed `Ok`. Returns how many.
pub fn mark_verified(store: &mut ManifestStore, diagnoses: &[Diagnosis], now: DateTime<Utc>) -> usize {
    let mut n = 0;
    for d in diagnoses.iter().filter(|d| d.is_ok()) {
        if let Some(entry) = store.get_mut(&d.filename) {
            entry.last_verified = Some(now);
            n += 1;
        }
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestEntry;

    const AUDIO: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00audio";

    fn entry(name: &str, len: u64, embedded: bool) -> ManifestEntry {
        ManifestEntry {
            filename: name.into(),
            source_url: "https://h/x.mp3".into(),
            published: None,
            content_length: len,
            checksum: None,
            metadata_embedded: embedded,
            last_verified: None,
        }
    }

    fn setup() -> (tempfile::TempDir, ArchiveLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArchiveLayout::new(dir.path());
        layout.create_dirs().unwrap();
        (dir, layout)
    }

    #[test]
    fn classifies_each_case() {
        let (_dir, layout) = setup();
        let ep = layout.episodes_dir();
        std::fs::write(ep.join("a-ok.mp3"), AUDIO).unwrap();
        std::fs::write(ep.join("b-notags.mp3"), AUDIO).unwrap();
        std::fs::write(ep.join("c-html.mp3"), b"<html></html>").unwrap();
        std::fs::write(ep.join("e-short.mp3"), AUDIO).unwrap();
        std::fs::write(ep.join("z-orphan.mp3"), AUDIO).unwrap();
        std::fs::write(ep.join(".podarc-abc.tmp"), b"partial").unwrap();

        let mut store = ManifestStore::new(layout.manifest_path());
        store.upsert(entry("a-ok.mp3", AUDIO.len() as u64, true));
        store.upsert(entry("b-notags.mp3", AUDIO.len() as u64, false));
        store.upsert(entry("c-html.mp3", 13, true));
        store.upsert(entry("d-missing.mp3", 10, true));
        store.upsert(entry("e-short.mp3", 9999, true));

        let diags = verify(&layout, &store);
        let kinds: Vec<_> = diags.iter().map(|d| (d.filename.as_str(), &d.kind)).collect();
        assert_eq!(kinds[0], ("a-ok.mp3", &DiagnosisKind::Ok));
        assert_eq!(kinds[1], ("b-notags.mp3", &DiagnosisKind::MetadataMissing));
        assert!(matches!(kinds[2].1, DiagnosisKind::UnreadableFile { .. }));
        assert_eq!(kinds[3], ("d-missing.mp3", &DiagnosisKind::MissingFile));
        assert!(matches!(kinds[4].1, DiagnosisKind::UnreadableFile { reason } if reason.contains("9999")));
        assert_eq!(kinds[5], ("z-orphan.mp3", &DiagnosisKind::Orphan));
        assert!(matches!(kinds[6].1, DiagnosisKind::StaleTemp { .. }));
        assert_eq!(diags.len(), 7);

        let summary = VerifySummary::from_diagnoses(&diags);
        assert_eq!(summary.ok, 1);
        assert_eq!(summary.unreadable, 2);
        assert!(!summary.is_clean());
    }

    #[test]
    fn mark_verified_stamps_ok_only() {
        let (_dir, layout) = setup();
        std::fs::write(layout.episode_path("a.mp3"), AUDIO).unwrap();
        let mut store = ManifestStore::new(layout.manifest_path());
        store.upsert(entry("a.mp3", AUDIO.len() as u64, true));
        store.upsert(entry("b.mp3", 1, true));
        let diags = verify(&layout, &store);
        let now = Utc::now();
        assert_eq!(mark_verified(&mut store, &diags, now), 1);
        assert_eq!(store.get("a.mp3").unwrap().last_verified, Some(now));
        assert!(store.get("b.mp3").unwrap().last_verified.is_none());
    }

    #[test]
    fn empty_archive_is_clean() {
        let (_dir, layout) = setup();
        let store = ManifestStore::new(layout.manifest_path());
        let diags = verify(&layout, &store);
        assert!(diags.is_empty());
        assert!(VerifySummary::from_diagnoses(&diags).is_clean());
    }

    #[test]
    fn untagged_entry_with_drifted_size_needs_tags_again() {
        let (_dir, layout) = setup();
        let mut retagged = AUDIO.to_vec();
        retagged.extend_from_slice(b"TAGS");
        std::fs::write(layout.episode_path("a.mp3"), &retagged).unwrap();
        let mut store = ManifestStore::new(layout.manifest_path());
        store.upsert(entry("a.mp3", AUDIO.len() as u64, false));

        let diags = verify(&layout, &store);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosisKind::MetadataMissing);
    }

    #[test]
    fn hidden_untracked_files_are_orphans() {
        let (_dir, layout) = setup();
        let ep = layout.episodes_dir();
        std::fs::write(ep.join(".hidden.mp3"), AUDIO).unwrap();
        std::fs::write(ep.join(".podarc-x.tmp"), b"partial").unwrap();
        let store = ManifestStore::new(layout.manifest_path());

        let diags = verify(&layout, &store);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].filename, ".hidden.mp3");
        assert_eq!(diags[0].kind, DiagnosisKind::Orphan);
        assert!(matches!(diags[1].kind, DiagnosisKind::StaleTemp { .. }));
    }
}
