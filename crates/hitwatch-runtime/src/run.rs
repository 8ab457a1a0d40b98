//! `hitwatch run`: replay or follow an access log.

use std::fs::File;
use std::io::{self, BufReader};

use anyhow::Context;
use hitwatch_source::RecordReader;

use crate::config::Settings;
use crate::follow::{follow, shutdown_signal};
use crate::pipeline::{ConsoleSink, Pipeline};

pub async fn cmd_run(settings: Settings) -> anyhow::Result<()> {
    let file = File::open(&settings.log_path)
        .with_context(|| format!("failed to open access log {}", settings.log_path.display()))?;
    let mut pipeline = Pipeline::new(&settings)?;
    let mut sink = ConsoleSink::new(io::stdout().lock(), settings.format);

    tracing::info!(
        log_path = %settings.log_path.display(),
        threshold = settings.alert.threshold,
        interval_secs = settings.interval_secs,
        follow = settings.follow,
        "hitwatch starting"
    );

    if settings.follow {
        let mut reader = RecordReader::following(BufReader::new(file));
        follow(
            &mut pipeline,
            &mut reader,
            &mut sink,
            settings.poll_interval,
            shutdown_signal(),
        )
        .await
    } else {
        let mut reader = RecordReader::new(BufReader::new(file));
        pipeline.drain(&mut reader, &mut sink)?;
        pipeline.finish(&mut sink)
    }
}
