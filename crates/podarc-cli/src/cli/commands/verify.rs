//! `podarc verify` – check an archive against its manifest, optionally repairing tags.

use anyhow::{Context, Result};
use podarc_core::archive::ArchiveLayout;
use podarc_core::config::ArchiveConfig;
use podarc_core::embed::LoftyEmbedder;
use podarc_core::manifest::{ManifestStore, ShowRecord};
use podarc_core::scheduler::RunStats;
use podarc_core::verify::{self, RepairOptions, VerifySummary};
use std::path::{Path, PathBuf};

pub async fn run_verify(cfg: &ArchiveConfig, dir: &Path, repair: bool) -> Result<()> {
    let dir: PathBuf = dir.to_path_buf();
    let compute_checksums = cfg.compute_checksums;
    tokio::task::spawn_blocking(move || verify_blocking(&dir, repair, compute_checksums))
        .await
        .context("verify task")?
}

fn verify_blocking(dir: &Path, repair: bool, compute_checksums: bool) -> Result<()> {
    let layout = ArchiveLayout::new(dir);
    let manifest_path = layout.manifest_path();
    if !manifest_path.exists() {
        anyhow::bail!("no manifest at {}", manifest_path.display());
    }
    let mut store = ManifestStore::load(manifest_path)?;
    let mut diagnoses = verify::verify(&layout, &store);

    if repair {
        let show = ShowRecord::load(&layout.show_path())?;
        let stats = RunStats::new();
        let opts = RepairOptions {
            enabled: true,
            compute_checksums,
        };
        let report = verify::repair(
            &diagnoses,
            &layout,
            &LoftyEmbedder,
            &mut store,
            show.as_ref(),
            &stats,
            &opts,
        )?;
        for name in &report.retagged {
            println!("REPAIRED  {}", name);
        }
        for (name, why) in &report.failed {
            println!("REPAIR FAILED {}: {}", name, why);
        }
        for path in &report.temps_removed {
            println!("REMOVED   {}", path.display());
        }
        diagnoses = verify::verify(&layout, &store);
    }

    for d in diagnoses.iter().filter(|d| !d.is_ok()) {
        println!("{}", d);
    }
    let stamped = verify::mark_verified(&mut store, &diagnoses, chrono::Utc::now());
    if stamped > 0 {
        store.persist()?;
    }

    let summary = VerifySummary::from_diagnoses(&diagnoses);
    println!(
        "{} ok, {} missing, {} corrupt, {} untagged, {} untracked, {} stale temp",
        summary.ok,
        summary.missing,
        summary.unreadable,
        summary.metadata_missing,
        summary.orphans,
        summary.stale_temps
    );
    if !summary.is_clean() {
        anyhow::bail!("archive has problems");
    }
    Ok(())
}
