//! hitwatch: HTTP access-log traffic monitor.

use clap::Parser;
use hitwatch_runtime::cli::{Cli, Command, RunOpts};
use hitwatch_runtime::config::{FileConfig, Settings};
use hitwatch_runtime::run::cmd_run;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let filter = std::env::var("HITWATCH_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let command = args
        .command
        .unwrap_or_else(|| Command::Run(RunOpts::default()));

    match command {
        Command::Run(opts) => {
            let settings = Settings::resolve(&opts)?;
            cmd_run(settings).await?;
        }
        Command::CheckConfig(opts) => {
            print!("{}", FileConfig::check(&opts.path)?);
        }
    }

    Ok(())
}
