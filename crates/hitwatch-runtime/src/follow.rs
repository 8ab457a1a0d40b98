//! Follow mode: poll the log for appended lines until ctrl-c / SIGTERM.

use std::io::BufRead;
use std::time::Duration;

use anyhow::Context;
use hitwatch_source::RecordReader;
use tokio::time::{MissedTickBehavior, interval};

use crate::pipeline::{EventSink, Pipeline};

/// Drain `reader` every `poll_interval` until `shutdown` resolves, then
/// process what is left (including an unterminated last line) and flush
/// the open report interval.
pub async fn follow<R, F>(
    pipeline: &mut Pipeline,
    reader: &mut RecordReader<R>,
    sink: &mut impl EventSink,
    poll_interval: Duration,
    shutdown: F,
) -> anyhow::Result<()>
where
    R: BufRead,
    F: Future<Output = anyhow::Result<()>>,
{
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                break;
            }
            _ = ticker.tick() => {
                pipeline.drain(reader, sink)?;
            }
        }
    }

    pipeline.drain_to_end(reader, sink)?;
    pipeline.finish(sink)
}

/// Resolves on ctrl-c, or SIGTERM on unix.
pub async fn shutdown_signal() -> anyhow::Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .context("failed to register SIGTERM handler")?;
        tokio::select! {
            result = ctrl_c => {
                result.context("failed to listen for ctrl-c")?;
                tracing::info!("received ctrl-c, shutting down");
            }
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.context("failed to listen for ctrl-c")?;
        tracing::info!("received ctrl-c, shutting down");
    }

    Ok(())
}
