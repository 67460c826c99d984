//! Crash- and interrupt-safe file replacement.
//!
//! Every archive file (episode audio, manifest, feed copies, artwork) is
//! produced in a hidden sibling temp file in the destination's own directory,
//! synced, and renamed onto the destination. Readers (including sync clients
//! replicating the archive folder) only ever see the previous content or the
//! complete new content.

mod error;
mod writer;

pub use error::WriteError;
pub use writer::{replace_in_place, write, write_bytes};

/// Prefix of in-flight temp files; verify treats leftovers as stale.
pub const TEMP_PREFIX: &str = ".podarc-";

/// Suffix of in-flight temp files.
pub const TEMP_SUFFIX: &str = ".tmp";

/// True if `name` looks like a temp file left behind by an interrupted write.
pub fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Write(String),
        Producer(&'static str),
    }

    impl From<WriteError> for TestError {
        fn from(e: WriteError) -> Self {
            TestError::Write(e.to_string())
        }
    }

    fn dir_names(dir: &std::path::Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn temp_names_recognized() {
        assert!(is_temp_name(".podarc-abc123.tmp"));
        assert!(!is_temp_name("240101-Episode.mp3"));
        assert!(!is_temp_name(".podarc-abc123"));
    }

    #[test]
    fn write_creates_destination_with_full_content() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("episode.mp3");
        let n = write(&dest, |f| -> Result<usize, WriteError> {
            f.write_all(b"hello world").unwrap();
            Ok(11)
        })
        .unwrap();
        assert_eq!(n, 11);
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello world");
        assert_eq!(dir_names(dir.path()), vec!["episode.mp3".to_string()]);
    }

    #[test]
    fn failed_producer_leaves_absent_destination_absent() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("episode.mp3");
        let res: Result<(), TestError> = write(&dest, |f| {
            f.write_all(b"partial").unwrap();
            Err(TestError::Producer("connection reset"))
        });
        assert_eq!(res.unwrap_err(), TestError::Producer("connection reset"));
        assert!(!dest.exists());
        assert!(dir_names(dir.path()).is_empty(), "temp file must be removed");
    }

    #[test]
    fn failed_producer_keeps_prior_content() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("manifest.json");
        std::fs::write(&dest, b"[old]").unwrap();
        let res: Result<(), TestError> = write(&dest, |f| {
            f.write_all(b"[new, truncat").unwrap();
            Err(TestError::Producer("interrupted"))
        });
        assert!(res.is_err());
        assert_eq!(std::fs::read(&dest).unwrap(), b"[old]");
        assert_eq!(dir_names(dir.path()), vec!["manifest.json".to_string()]);
    }

    #[test]
    fn panicking_producer_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("episode.mp3");
        std::fs::write(&dest, b"previous").unwrap();
        let dest_clone = dest.clone();
        let outcome = std::panic::catch_unwind(move || {
            let _: Result<(), WriteError> = write(&dest_clone, |f| {
                f.write_all(b"half").unwrap();
                panic!("worker died mid-write");
            });
        });
        assert!(outcome.is_err());
        assert_eq!(std::fs::read(&dest).unwrap(), b"previous");
        assert_eq!(dir_names(dir.path()), vec!["episode.mp3".to_string()]);
    }

    #[test]
    fn missing_directory_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no-such-dir").join("episode.mp3");
        let err = write_bytes(&dest, b"data").unwrap_err();
        assert_eq!(err.category(), crate::policy::ErrorCategory::DiskWrite);
        assert!(!dest.exists());
    }

    #[test]
    fn replace_in_place_edits_copy_then_swaps() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("episode.mp3");
        std::fs::write(&dest, b"audio").unwrap();
        replace_in_place(&dest, |tmp| -> Result<(), WriteError> {
            assert_ne!(tmp, dest.as_path());
            assert_eq!(std::fs::read(tmp).unwrap(), b"audio");
            let mut f = std::fs::OpenOptions::new().append(true).open(tmp).unwrap();
            f.write_all(b"+tags").unwrap();
            Ok(())
        })
        .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"audio+tags");
        assert_eq!(dir_names(dir.path()), vec!["episode.mp3".to_string()]);
    }

    #[test]
    fn replace_in_place_failure_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("episode.mp3");
        std::fs::write(&dest, b"audio").unwrap();
        let res: Result<(), TestError> = replace_in_place(&dest, |tmp| {
            std::fs::write(tmp, b"garbage").unwrap();
            Err(TestError::Producer("tag write failed"))
        });
        assert!(res.is_err());
        assert_eq!(std::fs::read(&dest).unwrap(), b"audio");
        assert_eq!(dir_names(dir.path()), vec!["episode.mp3".to_string()]);
    }
}
