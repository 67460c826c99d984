use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::policy::Resolution;
use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per round (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 1.0,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/podarc/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Episodes downloaded at once (1 = sequential).
    pub concurrency: usize,
    /// Extra rounds a job gets when the operator answers "retry" for its category.
    pub max_policy_retries: u32,
    /// Answer used for every category when running without a terminal.
    #[serde(default = "default_non_interactive_resolution")]
    pub non_interactive_resolution: Resolution,
    /// Record a SHA-256 of every archived file in the manifest.
    #[serde(default = "default_true")]
    pub compute_checksums: bool,
    /// Seconds allowed for establishing a connection.
    pub connect_timeout_secs: u64,
    /// Abort a transfer that stays under 1 KiB/s for this many seconds.
    pub low_speed_timeout_secs: u64,
    /// Optional User-Agent override; libcurl's default otherwise.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

fn default_true() -> bool {
    true
}

fn default_non_interactive_resolution() -> Resolution {
    Resolution::SkipAllOfCategory
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            max_policy_retries: 2,
            non_interactive_resolution: default_non_interactive_resolution(),
            compute_checksums: true,
            connect_timeout_secs: 30,
            low_speed_timeout_secs: 60,
            user_agent: None,
            retry: None,
        }
    }
}

impl ArchiveConfig {
    /// Retry policy from the `[retry]` section, or the built-in default.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone().unwrap_or_default().to_policy()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("podarc")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ArchiveConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ArchiveConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ArchiveConfig = toml::from_str(&data)?;
    Ok(cfg)
}
