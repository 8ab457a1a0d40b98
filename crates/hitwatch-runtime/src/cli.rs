//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "hitwatch", about = "HTTP access-log traffic monitor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay (or follow) an access log, printing alerts and interval reports
    Run(RunOpts),
    /// Validate a TOML config file and print it back in normalized form
    CheckConfig(CheckConfigOpts),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunOpts {
    /// Access log to read (default: data/sample_csv.txt)
    #[arg(long, short = 'l')]
    pub log_path: Option<PathBuf>,

    /// Alert threshold in hits/second (default: 10)
    #[arg(long, short = 't')]
    pub threshold: Option<f64>,

    /// TOML config file; CLI flags take precedence over its values
    #[arg(long, short = 'c', env = "HITWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Report interval length in seconds (default: 10)
    #[arg(long)]
    pub interval_secs: Option<u32>,

    /// Output format for alerts and reports
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Stop at the first malformed record instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Keep reading lines appended to the log until ctrl-c
    #[arg(long, short = 'f')]
    pub follow: bool,

    /// Poll interval in milliseconds for --follow
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
}

#[derive(clap::Args)]
pub struct CheckConfigOpts {
    /// Config file to validate
    pub path: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable blocks
    #[default]
    Text,
    /// One JSON object per line
    Json,
}
