//! hitwatch-report: fixed-interval traffic analytics.
//! Groups records into 10-second intervals and summarizes each one
//! (busiest sections, error statuses, response sizes). Runs alongside the
//! alert engine on the same record stream and shares no state with it.

pub mod analytics;
pub mod bucket;

pub use analytics::{ByteStats, DetailHits, ErrorHits, SectionHits, TrafficReport, summarize};
pub use bucket::{DEFAULT_INTERVAL_SECS, IntervalBucketer, IntervalOutcome};
