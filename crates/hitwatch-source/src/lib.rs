//! hitwatch-source: access-log IO boundary.
//! Parses comma-delimited access-log rows into `LogRecord`s in arrival
//! order. No alerting or reporting logic.

pub mod error;
pub mod reader;
pub mod record;

pub use error::SourceError;
pub use reader::RecordReader;
pub use record::{FIELD_COUNT, LogRecord, ParsedLine, parse_line};
