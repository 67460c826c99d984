//! CLI command handlers, one per file.

mod backup;
mod checksum;
mod docs;
mod verify;

pub use backup::{run_backup, BackupArgs};
pub use checksum::run_checksum;
pub use docs::{run_completions, run_man};
pub use verify::run_verify;
