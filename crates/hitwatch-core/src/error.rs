//! Error types for the alert engine.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Rejected before any window state was touched.
    #[error("invalid timestamp {value:?}: {detail}")]
    InvalidTimestamp { value: String, detail: String },

    #[error("invalid alert threshold {0}: expected a finite, non-negative hits/second value")]
    InvalidThreshold(f64),
}
