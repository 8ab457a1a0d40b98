//! Pipeline: wires record source → {alert window, interval bucketer} → sink.
//!
//! Every record feeds both consumers. The alert window sees only the
//! timestamp; the bucketer sees the full record. Alerts for a record are
//! emitted before the intervals it closes.

use std::io::{BufRead, Write};

use anyhow::Context;
use hitwatch_core::{AlertEvent, EngineError, Window};
use hitwatch_report::{IntervalBucketer, IntervalOutcome};
use hitwatch_source::{LogRecord, RecordReader, SourceError};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::config::Settings;
use crate::render::render_event;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PipelineEvent {
    Alert(AlertEvent),
    Interval(IntervalOutcome),
}

/// Counters for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub records: u64,
    pub skipped: u64,
    pub alerts: u64,
}

// ─── Sink ───────────────────────────────────────────────────────────

/// Destination for pipeline events.
pub trait EventSink {
    fn emit(&mut self, event: &PipelineEvent) -> anyhow::Result<()>;
}

impl EventSink for Vec<PipelineEvent> {
    fn emit(&mut self, event: &PipelineEvent) -> anyhow::Result<()> {
        self.push(event.clone());
        Ok(())
    }
}

/// Writes rendered text blocks or JSON lines.
pub struct ConsoleSink<W> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for ConsoleSink<W> {
    fn emit(&mut self, event: &PipelineEvent) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.out, "{}", render_event(event))?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, event)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

// ─── Pipeline ───────────────────────────────────────────────────────

pub struct Pipeline {
    window: Window,
    bucketer: IntervalBucketer,
    strict: bool,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new(settings: &Settings) -> Result<Self, EngineError> {
        Ok(Self {
            window: Window::from_config(&settings.alert)?,
            bucketer: IntervalBucketer::new(settings.interval_secs),
            strict: settings.strict,
            stats: PipelineStats::default(),
        })
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Feed one record to both consumers and return what it triggered.
    pub fn process(&mut self, record: LogRecord) -> Result<Vec<PipelineEvent>, EngineError> {
        let alert = self.window.consume(record.timestamp)?;
        self.stats.records += 1;

        let mut events = Vec::new();
        if let Some(alert) = alert {
            self.stats.alerts += 1;
            events.push(PipelineEvent::Alert(alert));
        }
        events.extend(
            self.bucketer
                .push(record)
                .into_iter()
                .map(PipelineEvent::Interval),
        );
        Ok(events)
    }

    /// Process every record currently available from `reader`.
    ///
    /// Malformed records are logged and skipped unless the pipeline is
    /// strict. Read failures always abort.
    pub fn drain<R: BufRead>(
        &mut self,
        reader: &mut RecordReader<R>,
        sink: &mut impl EventSink,
    ) -> anyhow::Result<()> {
        loop {
            let next = reader.next_record();
            if !self.ingest(next, reader.line_num(), sink)? {
                return Ok(());
            }
        }
    }

    /// Like [`Pipeline::drain`], then also process a trailing line that
    /// was held back for lack of a newline. Used once input has ended.
    pub fn drain_to_end<R: BufRead>(
        &mut self,
        reader: &mut RecordReader<R>,
        sink: &mut impl EventSink,
    ) -> anyhow::Result<()> {
        self.drain(reader, sink)?;
        let last = reader.finish();
        self.ingest(last, reader.line_num(), sink)?;
        Ok(())
    }

    /// Handle one reader result. Returns `false` once the reader is
    /// exhausted.
    fn ingest(
        &mut self,
        next: Result<Option<LogRecord>, SourceError>,
        line_num: usize,
        sink: &mut impl EventSink,
    ) -> anyhow::Result<bool> {
        let record = match next {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(false),
            Err(e) if e.is_record_error() && !self.strict => {
                tracing::warn!("skipping record: {e}");
                self.stats.skipped += 1;
                return Ok(true);
            }
            Err(e) => return Err(e).context("reading access log"),
        };

        let events = match self.process(record) {
            Ok(events) => events,
            Err(e) if !self.strict => {
                tracing::warn!(line_num, "skipping record: {e}");
                self.stats.skipped += 1;
                return Ok(true);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("processing log line {line_num}"));
            }
        };
        for event in &events {
            sink.emit(event)?;
        }
        Ok(true)
    }

    /// Flush the open report interval.
    pub fn finish(&mut self, sink: &mut impl EventSink) -> anyhow::Result<()> {
        if let Some(outcome) = self.bucketer.finish() {
            sink.emit(&PipelineEvent::Interval(outcome))?;
        }
        tracing::info!(
            records = self.stats.records,
            skipped = self.stats.skipped,
            alerts = self.stats.alerts,
            "log processed"
        );
        Ok(())
    }
}
