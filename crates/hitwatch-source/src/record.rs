//! LogRecord and the comma-delimited access-log line parser.
//!
//! Column order: remote host, rfc931 identity, auth user, timestamp
//! (integer seconds), request line, status code, byte count. Any column may
//! be wrapped in double quotes.

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Number of columns in an access-log row.
pub const FIELD_COUNT: usize = 7;

/// Column index of the timestamp.
pub const TIMESTAMP_FIELD: usize = 3;

/// Name of the timestamp column in the header row.
pub const HEADER_TIMESTAMP: &str = "date";

/// One parsed access-log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub remote_host: String,
    pub rfc931: String,
    pub auth_user: String,
    /// Seconds since the epoch.
    pub timestamp: i64,
    /// Raw request line, e.g. `GET /api/user HTTP/1.0`.
    pub request: String,
    pub status: u16,
    pub bytes: u64,
}

impl LogRecord {
    /// HTTP method: first token of the request line.
    pub fn method(&self) -> &str {
        self.request.split_whitespace().next().unwrap_or("")
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        let target = self.request.split_whitespace().nth(1).unwrap_or("");
        target.split('?').next().unwrap_or(target)
    }

    /// First path segment: `/api/user` → `api`, `/` → ``.
    pub fn section(&self) -> &str {
        self.path()
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or("")
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Outcome of parsing one raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Record(LogRecord),
    Header,
    Blank,
}

/// Parse one raw line. `line_num` is 1-based and only used for errors.
pub fn parse_line(line: &str, line_num: usize) -> Result<ParsedLine, SourceError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(ParsedLine::Blank);
    }

    let fields = split_fields(trimmed, line_num)?;
    if fields.len() != FIELD_COUNT {
        return Err(SourceError::Parse {
            line_num,
            detail: format!(
                "expected {FIELD_COUNT} comma-separated fields, got {}",
                fields.len()
            ),
        });
    }

    if fields[TIMESTAMP_FIELD] == HEADER_TIMESTAMP {
        return Ok(ParsedLine::Header);
    }

    let timestamp =
        fields[TIMESTAMP_FIELD]
            .parse::<i64>()
            .map_err(|_| SourceError::InvalidTimestamp {
                line_num,
                value: fields[TIMESTAMP_FIELD].clone(),
            })?;

    let status = fields[5].parse::<u16>().map_err(|e| SourceError::Parse {
        line_num,
        detail: format!("invalid status {:?}: {e}", fields[5]),
    })?;

    let bytes = match fields[6].as_str() {
        "-" => 0,
        raw => raw.parse::<u64>().map_err(|e| SourceError::Parse {
            line_num,
            detail: format!("invalid byte count {raw:?}: {e}"),
        })?,
    };

    let [remote_host, rfc931, auth_user, _, request, _, _]: [String; FIELD_COUNT] =
        fields.try_into().map_err(|_| SourceError::Parse {
            line_num,
            detail: "field count changed while parsing".to_string(),
        })?;

    Ok(ParsedLine::Record(LogRecord {
        remote_host,
        rfc931,
        auth_user,
        timestamp,
        request,
        status,
        bytes,
    }))
}

/// Split on commas outside double quotes. `""` inside a quoted field is a
/// literal quote. Unquoted fields are trimmed.
fn split_fields(line: &str, line_num: usize) -> Result<Vec<String>, SourceError> {
    let mut fields = Vec::with_capacity(FIELD_COUNT);
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() && !quoted => {
                current.clear();
                in_quotes = true;
                quoted = true;
            }
            ',' if !in_quotes => {
                fields.push(finish_field(&mut current, quoted));
                quoted = false;
            }
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(SourceError::Parse {
            line_num,
            detail: "unterminated quoted field".to_string(),
        });
    }
    fields.push(finish_field(&mut current, quoted));
    Ok(fields)
}

fn finish_field(current: &mut String, quoted: bool) -> String {
    let field = std::mem::take(current);
    if quoted {
        field
    } else {
        field.trim().to_string()
    }
}
