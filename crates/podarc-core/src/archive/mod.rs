//! Show archive: directory layout and the end-to-end backup run.

mod backup;
mod layout;

pub use backup::{backup, BackupDeps, BackupReport, BackupRequest};
pub use layout::{
    ArchiveLayout, EPISODES_DIR, IMPORT_FEED_FILE, MANIFEST_FILE, ORIGINAL_FEED_FILE, SHOW_FILE,
};
