//! Error types for the access-log source.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to parse log line {line_num}: {detail}")]
    Parse { line_num: usize, detail: String },

    #[error("invalid timestamp {value:?} on log line {line_num}")]
    InvalidTimestamp { line_num: usize, value: String },

    #[error("log read error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Line the error refers to, if any.
    pub fn line_num(&self) -> Option<usize> {
        match self {
            SourceError::Parse { line_num, .. } | SourceError::InvalidTimestamp { line_num, .. } => {
                Some(*line_num)
            }
            SourceError::Io(_) => None,
        }
    }

    /// Malformed record, as opposed to a failure of the underlying reader.
    pub fn is_record_error(&self) -> bool {
        !matches!(self, SourceError::Io(_))
    }
}
