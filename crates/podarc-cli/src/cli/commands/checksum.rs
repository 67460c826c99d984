//! `podarc checksum`: SHA-256 of a file, in `sha256sum` format.

use anyhow::Result;
use podarc_core::checksum;
use std::path::Path;

pub async fn run_checksum(path: &Path) -> Result<()> {
    let path = path.to_path_buf();
    let digest = tokio::task::spawn_blocking({
        let path = path.clone();
        move || checksum::sha256_path(&path)
    })
    .await??;
    println!("{}  {}", digest, path.display());
    Ok(())
}
