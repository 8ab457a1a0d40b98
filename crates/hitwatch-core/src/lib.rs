//! hitwatch-core: rolling 2-minute hit-rate window and surge alert engine.
//!
//! Consumes one timestamp per access-log record and reports when the average
//! hit rate over the trailing 120 seconds crosses the configured threshold.
//! No I/O, no parsing of log lines; those live in `hitwatch-source`.

pub mod config;
pub mod error;
pub mod ledger;
pub mod types;
pub mod window;

pub use config::{AlertConfig, DEFAULT_THRESHOLD};
pub use error::EngineError;
pub use ledger::SlotLedger;
pub use types::{AlertEvent, AlertState, TimeSlot};
pub use window::{WINDOW_SECS, Window};
