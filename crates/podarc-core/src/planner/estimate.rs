//! Pre-run size estimate shown to the operator before anything is downloaded.

use std::path::Path;

use super::ArchivalJob;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadEstimate {
    /// Sum of advertised enclosure lengths for jobs still to download.
    pub total_bytes: u64,
    pub to_download: usize,
    pub existing: usize,
    /// Free space on the archive filesystem, when it can be queried.
    pub free_bytes: Option<u64>,
}

impl DownloadEstimate {
    /// True when the filesystem is known to be too small for the estimate.
    pub fn exceeds_free_space(&self) -> bool {
        matches!(self.free_bytes, Some(free) if free < self.total_bytes)
    }
}

/// Counts jobs whose file already exists (only when `skip_existing`) and sums
/// the advertised size of the rest.
pub fn estimate(jobs: &[ArchivalJob], episodes_dir: &Path, skip_existing: bool) -> DownloadEstimate {
    let mut est = DownloadEstimate {
        free_bytes: free_space(episodes_dir),
        ..DownloadEstimate::default()
    };
    for job in jobs {
        if skip_existing && episodes_dir.join(&job.filename).exists() {
            est.existing += 1;
        } else {
            est.to_download += 1;
            est.total_bytes += job.episode.media_length.unwrap_or(0);
        }
    }
    est
}

#[cfg(unix)]
fn free_space(dir: &Path) -> Option<u64> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(dir.as_os_str().as_bytes()).ok()?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return None;
    }
    Some((stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64))
}

#[cfg(not(unix))]
fn free_space(_dir: &Path) -> Option<u64> {
    None
}

/// Human-readable byte count (`1.5 MB`).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
