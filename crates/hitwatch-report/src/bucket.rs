//! Fixed-length interval bucketing of the record stream.
//!
//! The first record opens an interval at its own timestamp. Records with
//! `timestamp <= start + interval` join the open interval (including late
//! records older than `start`). The first record past that bound closes the
//! interval, and any fully empty intervals in between are reported as one
//! quiet run before the record opens the next interval.

use hitwatch_source::LogRecord;
use serde::Serialize;

use crate::analytics::{TrafficReport, summarize};

/// Default interval length in seconds.
pub const DEFAULT_INTERVAL_SECS: u32 = 10;

/// Result of closing one or more intervals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntervalOutcome {
    Report(TrafficReport),
    /// `intervals` consecutive intervals without records, the first
    /// starting at `start`.
    Quiet { start: i64, intervals: u64 },
}

#[derive(Debug, Clone)]
pub struct IntervalBucketer {
    interval_secs: i64,
    start: Option<i64>,
    records: Vec<LogRecord>,
}

impl IntervalBucketer {
    /// A zero interval is treated as one second.
    pub fn new(interval_secs: u32) -> Self {
        Self {
            interval_secs: i64::from(interval_secs.max(1)),
            start: None,
            records: Vec::new(),
        }
    }

    pub fn interval_secs(&self) -> i64 {
        self.interval_secs
    }

    /// Start of the open interval, if any record has been seen.
    pub fn current_start(&self) -> Option<i64> {
        self.start
    }

    /// Records collected in the open interval.
    pub fn pending(&self) -> usize {
        self.records.len()
    }

    /// Add a record, returning the intervals it closed (at most one report
    /// followed by at most one quiet run).
    pub fn push(&mut self, record: LogRecord) -> Vec<IntervalOutcome> {
        let ts = record.timestamp;
        let start = *self.start.get_or_insert(ts);

        if ts <= start.saturating_add(self.interval_secs) {
            self.records.push(record);
            return Vec::new();
        }

        let mut closed = Vec::with_capacity(2);
        let records = std::mem::take(&mut self.records);
        tracing::debug!(start, records = records.len(), "closing report interval");
        closed.push(IntervalOutcome::Report(summarize(start, self.interval_secs, &records)));

        // `ts > next` here, so the gap is at least one second and fits in
        // a u64 even when the two timestamps are far apart.
        let next = start.saturating_add(self.interval_secs);
        let step = self.interval_secs.unsigned_abs();
        let skipped = (ts.abs_diff(next) - 1) / step;
        if skipped > 0 {
            closed.push(IntervalOutcome::Quiet {
                start: next,
                intervals: skipped,
            });
        }

        // Lands on the interval with `start < ts <= start + interval`.
        self.start = Some(next.saturating_add_unsigned(skipped * step));
        self.records.push(record);
        closed
    }

    /// Close the open interval, if it holds any records.
    pub fn finish(&mut self) -> Option<IntervalOutcome> {
        let start = self.start.take()?;
        let records = std::mem::take(&mut self.records);
        if records.is_empty() {
            return None;
        }
        Some(IntervalOutcome::Report(summarize(start, self.interval_secs, &records)))
    }
}

impl Default for IntervalBucketer {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_SECS)
    }
}
