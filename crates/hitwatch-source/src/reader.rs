//! Line-oriented record reader over any `BufRead`.

use std::io::BufRead;

use crate::error::SourceError;
use crate::record::{LogRecord, ParsedLine, parse_line};

/// Yields parsed records in file order, skipping header and blank lines.
///
/// In follow mode a trailing line without a newline is held back until the
/// rest of it arrives, so a record that is still being written is never
/// parsed half-way. [`RecordReader::finish`] parses whatever is still held
/// back once no more input will arrive.
pub struct RecordReader<R> {
    inner: R,
    pending: Vec<u8>,
    line_num: usize,
    follow: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            line_num: 0,
            follow: false,
        }
    }

    /// Reader for a file that is still being appended to.
    pub fn following(inner: R) -> Self {
        Self {
            follow: true,
            ..Self::new(inner)
        }
    }

    /// Number of complete lines consumed so far.
    pub fn line_num(&self) -> usize {
        self.line_num
    }

    /// Bytes of an unterminated line held back in follow mode.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Next record, or `Ok(None)` once the currently available input is
    /// exhausted. In follow mode a later call may yield more records.
    pub fn next_record(&mut self) -> Result<Option<LogRecord>, SourceError> {
        loop {
            let read = self.inner.read_until(b'\n', &mut self.pending)?;

            if read == 0 {
                if self.pending.is_empty() || self.follow {
                    return Ok(None);
                }
            } else if !self.pending.ends_with(b"\n") {
                if self.follow {
                    return Ok(None);
                }
                // Last line without a newline; the next read reports EOF.
                continue;
            }

            if let Some(record) = self.parse_pending()? {
                return Ok(Some(record));
            }
        }
    }

    /// Parse the line held back in follow mode, treating end of input as
    /// its terminator.
    pub fn finish(&mut self) -> Result<Option<LogRecord>, SourceError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        self.parse_pending()
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn parse_pending(&mut self) -> Result<Option<LogRecord>, SourceError> {
        let bytes = std::mem::take(&mut self.pending);
        self.line_num += 1;
        let line = String::from_utf8(bytes).map_err(|e| SourceError::Parse {
            line_num: self.line_num,
            detail: format!("line is not valid UTF-8: {}", e.utf8_error()),
        })?;
        match parse_line(&line, self.line_num)? {
            ParsedLine::Record(record) => Ok(Some(record)),
            ParsedLine::Header | ParsedLine::Blank => Ok(None),
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<LogRecord, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
