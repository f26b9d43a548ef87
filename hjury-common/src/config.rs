//! Configuration loading and root folder resolution
//!
//! Resolution order for every setting: command-line argument, environment
//! variable, TOML config file, compiled default.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "HJURY_ROOT_FOLDER";

/// Default HTTP bind address for hjury-ai
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5810";

/// Contents of `hjury-ai.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the SQLite database
    pub root_folder: Option<PathBuf>,

    /// Address the HTTP server binds to
    pub bind_address: Option<String>,

    /// Personal access token for the GitHub API (lowest priority source)
    pub github_token: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub jury: JuryTuning,
}

/// Logging section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "hjury_ai=info,tower_http=info".to_string()
}

/// Tuning knobs for the jury pipeline (`[jury]` section)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JuryTuning {
    /// Candidates evaluated concurrently per batch
    pub batch_size: usize,
    /// Pause between batches (milliseconds)
    pub batch_delay_ms: u64,
    /// Rows per INSERT statement when persisting layer results
    pub insert_chunk_size: usize,
    /// Upper bound on the layer persistence transaction (milliseconds)
    pub transaction_timeout_ms: u64,
    /// Winners selected per category after the final layer
    pub top_k: usize,
    /// Sessions kept by the live progress tracker
    pub progress_max_sessions: u64,
    /// Idle time after which live progress for a session is evicted (seconds)
    pub progress_idle_secs: u64,
    /// GitHub API request budget
    pub github_requests_per_second: u32,
}

impl Default for JuryTuning {
    fn default() -> Self {
        Self {
            batch_size: 50,
            batch_delay_ms: 100,
            insert_chunk_size: 100,
            transaction_timeout_ms: 30_000,
            top_k: 5,
            progress_max_sessions: 1024,
            progress_idle_secs: 3600,
            github_requests_per_second: 10,
        }
    }
}

impl JuryTuning {
    /// Reject values that would stall or disable the pipeline
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("jury.batch_size must be at least 1".to_string()));
        }
        if self.insert_chunk_size == 0 {
            return Err(Error::Config(
                "jury.insert_chunk_size must be at least 1".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(Error::Config("jury.top_k must be at least 1".to_string()));
        }
        if self.github_requests_per_second == 0 {
            return Err(Error::Config(
                "jury.github_requests_per_second must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load a TOML config file; a missing file yields the defaults
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        tracing::debug!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.jury.validate()?;

    Ok(config)
}

/// Default location of the per-module config file, e.g. `~/.config/hjury/hjury-ai.toml`
pub fn default_config_path(module_name: &str) -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("hjury").join(format!("{}.toml", module_name)))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Resolve the root folder: CLI argument, then `HJURY_ROOT_FOLDER`, then TOML,
/// then the OS default
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hjury"))
        .unwrap_or_else(|| PathBuf::from("./hjury_data"))
}

/// User-Agent sent with outbound HTTP requests
pub fn get_user_agent() -> String {
    format!("hjury/{}", env!("CARGO_PKG_VERSION"))
}
