//! Settings resolution: defaults < TOML config file < CLI flags.
//!
//! ```toml
//! log_path = "/var/log/access.log"
//!
//! [alert]
//! threshold = 10.0
//!
//! [report]
//! interval_secs = 10
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use hitwatch_core::AlertConfig;
use hitwatch_report::DEFAULT_INTERVAL_SECS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::{OutputFormat, RunOpts};

pub const DEFAULT_LOG_PATH: &str = "data/sample_csv.txt";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid setting: {0}")]
    Invalid(String),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

// ─── File schema ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub log_path: Option<PathBuf>,
    pub alert: AlertConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub interval_secs: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Load and validate `path`, returning the file with every default
    /// filled in, as TOML.
    pub fn check(path: &Path) -> Result<String, ConfigError> {
        let file = Self::load(path)?;
        Settings::merge(file.clone(), &RunOpts::default())?;
        Ok(toml::to_string_pretty(&file)?)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ─── Resolved settings ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub log_path: PathBuf,
    pub alert: AlertConfig,
    pub interval_secs: u32,
    pub format: OutputFormat,
    pub strict: bool,
    pub follow: bool,
    pub poll_interval: Duration,
}

impl Settings {
    /// Merge CLI options over the config file named by `opts.config`, if any.
    pub fn resolve(opts: &RunOpts) -> Result<Self, ConfigError> {
        let file = match &opts.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(file, opts)
    }

    pub fn merge(file: FileConfig, opts: &RunOpts) -> Result<Self, ConfigError> {
        let threshold = opts.threshold.unwrap_or(file.alert.threshold);
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "threshold must be a non-negative number, got {threshold}"
            )));
        }

        let interval_secs = opts.interval_secs.unwrap_or(file.report.interval_secs);
        if interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "report interval must be at least one second".to_string(),
            ));
        }

        let poll_ms = opts.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        if poll_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll interval must be at least one millisecond".to_string(),
            ));
        }

        Ok(Self {
            log_path: opts
                .log_path
                .clone()
                .or(file.log_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH)),
            alert: AlertConfig { threshold },
            interval_secs,
            format: opts.format,
            strict: opts.strict,
            follow: opts.follow,
            poll_interval: Duration::from_millis(poll_ms),
        })
    }
}
