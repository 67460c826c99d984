//! Single owner of the manifest during a run.
//!
//! Workers send finished entries over a channel; this task applies them in
//! arrival order and rewrites `manifest.json` after each one, so an
//! interrupted run leaves a manifest that matches the files on disk.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::manifest::{ManifestEntry, ManifestStore};

pub(crate) const MANIFEST_QUEUE: usize = 64;

pub(crate) fn spawn_manifest_writer(
    mut store: ManifestStore,
    mut rx: mpsc::Receiver<ManifestEntry>,
) -> JoinHandle<ManifestStore> {
    tokio::task::spawn_blocking(move || {
        while let Some(entry) = rx.blocking_recv() {
            let filename = entry.filename.clone();
            store.upsert(entry);
            if let Err(e) = store.persist() {
                // The final persist after the run reports this to the caller.
                tracing::error!(file = %filename, error = %format!("{:#}", e), "manifest update failed");
            }
        }
        store
    })
}
