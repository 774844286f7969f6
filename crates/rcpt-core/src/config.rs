use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per receipt (including the first).
    pub max_attempts: u32,
    /// Lower bound of the jittered backoff factor, in seconds.
    pub min_backoff_secs: f64,
    /// Upper bound of the jittered backoff factor, in seconds.
    pub max_backoff_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_backoff_secs: 2.0,
            max_backoff_secs: 5.0,
        }
    }
}

/// Pacing between receipts (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Short pause after each receipt: lower bound in seconds.
    pub short_min_secs: f64,
    /// Short pause after each receipt: upper bound in seconds.
    pub short_max_secs: f64,
    /// Longer break: lower bound in seconds.
    pub long_min_secs: f64,
    /// Longer break: upper bound in seconds.
    pub long_max_secs: f64,
    /// Take the longer break after every N receipts (0 = never).
    pub long_break_every: usize,
    /// Wait before releasing the session at the end of a run.
    pub release_grace_secs: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            short_min_secs: 0.5,
            short_max_secs: 2.0,
            long_min_secs: 3.0,
            long_max_secs: 8.0,
            long_break_every: 10,
            release_grace_secs: 2.0,
        }
    }
}

impl PacingConfig {
    /// No pauses at all (dry runs and tests).
    pub fn none() -> Self {
        Self {
            short_min_secs: 0.0,
            short_max_secs: 0.0,
            long_min_secs: 0.0,
            long_max_secs: 0.0,
            long_break_every: 0,
            release_grace_secs: 0.0,
        }
    }
}

/// Global configuration loaded from `~/.config/rcpt/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RcptConfig {
    /// Column holding the receipt URL.
    pub link_column: String,
    /// Column appended to the output table.
    pub output_column: String,
    pub timestamp_column: String,
    pub merchant_column: String,
    pub amount_column: String,
    /// Directory receipts are written to (relative to the working directory).
    pub download_dir: PathBuf,
    /// Per-request timeout for receipt GETs.
    pub request_timeout_secs: u64,
    /// URL hit once after bridging to check the session; empty disables the check.
    #[serde(default)]
    pub validation_url: String,
    pub validation_timeout_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional pacing; if missing, built-in defaults are used.
    #[serde(default)]
    pub pacing: Option<PacingConfig>,
}

impl Default for RcptConfig {
    fn default() -> Self {
        Self {
            link_column: "Receipt Direct Link".to_string(),
            output_column: "Downloaded_Receipt_Filename".to_string(),
            timestamp_column: "Timestamp".to_string(),
            merchant_column: "Merchant".to_string(),
            amount_column: "Amount".to_string(),
            download_dir: PathBuf::from("expensify_receipts"),
            request_timeout_secs: 30,
            validation_url: "https://www.expensify.com/".to_string(),
            validation_timeout_secs: 10,
            retry: None,
            pacing: None,
        }
    }
}

impl RcptConfig {
    pub fn retry_or_default(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn pacing_or_default(&self) -> PacingConfig {
        self.pacing.clone().unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_secs(self.validation_timeout_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rcpt")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RcptConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RcptConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: RcptConfig = toml::from_str(&data)?;
    Ok(cfg)
}
