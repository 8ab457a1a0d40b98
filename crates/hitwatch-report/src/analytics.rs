//! Per-interval traffic summary.

use std::collections::HashMap;
use std::hash::Hash;

use hitwatch_source::LogRecord;
use serde::Serialize;

/// Sections listed in a report.
pub const TOP_SECTIONS: usize = 3;
/// Section/method/host groups listed in a report.
pub const TOP_DETAILS: usize = 5;
/// Error groups listed in a report.
pub const TOP_ERRORS: usize = 5;

// ─── Types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionHits {
    pub section: String,
    pub hits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailHits {
    pub section: String,
    pub method: String,
    pub remote_host: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorHits {
    pub status: u16,
    pub remote_host: String,
    pub count: usize,
}

/// Response size statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ByteStats {
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two records.
    pub std_dev: Option<f64>,
    pub max: u64,
}

/// Summary of one closed interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficReport {
    /// Interval start, seconds since the epoch.
    pub start: i64,
    pub interval_secs: i64,
    pub total_hits: usize,
    pub top_sections: Vec<SectionHits>,
    pub top_details: Vec<DetailHits>,
    pub top_errors: Vec<ErrorHits>,
    pub bytes: ByteStats,
}

// ─── Summary ────────────────────────────────────────────────────────

/// Summarize the records of the interval starting at `start`.
pub fn summarize(start: i64, interval_secs: i64, records: &[LogRecord]) -> TrafficReport {
    let top_sections = top_counts(records.iter().map(|r| r.section()), TOP_SECTIONS)
        .into_iter()
        .map(|(section, hits)| SectionHits {
            section: section.to_string(),
            hits,
        })
        .collect();

    let top_details = top_counts(
        records
            .iter()
            .map(|r| (r.section(), r.method(), r.remote_host.as_str())),
        TOP_DETAILS,
    )
    .into_iter()
    .map(|((section, method, host), count)| DetailHits {
        section: section.to_string(),
        method: method.to_string(),
        remote_host: host.to_string(),
        count,
    })
    .collect();

    let top_errors = top_counts(
        records
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| (r.status, r.remote_host.as_str())),
        TOP_ERRORS,
    )
    .into_iter()
    .map(|((status, host), count)| ErrorHits {
        status,
        remote_host: host.to_string(),
        count,
    })
    .collect();

    TrafficReport {
        start,
        interval_secs,
        total_hits: records.len(),
        top_sections,
        top_details,
        top_errors,
        bytes: ByteStats::from_records(records),
    }
}

/// Count occurrences and keep the `limit` largest groups. Ties are ordered
/// by key so reports are deterministic.
fn top_counts<K: Ord + Hash>(keys: impl Iterator<Item = K>, limit: usize) -> Vec<(K, usize)> {
    let mut counts: HashMap<K, usize> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut ranked: Vec<(K, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

impl ByteStats {
    pub fn from_records(records: &[LogRecord]) -> Self {
        let n = records.len();
        if n == 0 {
            return Self {
                mean: 0.0,
                std_dev: None,
                max: 0,
            };
        }

        let sum: f64 = records.iter().map(|r| r.bytes as f64).sum();
        let mean = sum / n as f64;
        let std_dev = (n > 1).then(|| {
            let squares: f64 = records
                .iter()
                .map(|r| (r.bytes as f64 - mean).powi(2))
                .sum();
            (squares / (n - 1) as f64).sqrt()
        });
        let max = records.iter().map(|r| r.bytes).max().unwrap_or(0);

        Self { mean, std_dev, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(host: &str, ts: i64, request: &str, status: u16, bytes: u64) -> LogRecord {
        LogRecord {
            remote_host: host.to_string(),
            rfc931: "-".to_string(),
            auth_user: "apache".to_string(),
            timestamp: ts,
            request: request.to_string(),
            status,
            bytes,
        }
    }

    fn sample() -> Vec<LogRecord> {
        vec![
            rec("10.0.0.2", 1549573860, "GET /api/user HTTP/1.0", 200, 1234),
            rec("10.0.0.4", 1549573860, "GET /api/user HTTP/1.0", 200, 1234),
            rec("10.0.0.4", 1549573860, "GET /api/user HTTP/1.0", 200, 1234),
            rec("10.0.0.2", 1549573860, "GET /api/help HTTP/1.0", 200, 1234),
            rec("10.0.0.5", 1549573860, "GET /api/help HTTP/1.0", 200, 1234),
            rec("10.0.0.4", 1549573859, "GET /api/help HTTP/1.0", 200, 1234),
            rec("10.0.0.5", 1549573860, "POST /report HTTP/1.0", 500, 1307),
            rec("10.0.0.3", 1549573860, "POST /report HTTP/1.0", 200, 1234),
            rec("10.0.0.3", 1549573860, "GET /report HTTP/1.0", 200, 1194),
        ]
    }

    #[test]
    fn most_hit_sections() {
        let report = summarize(1549573860, 10, &sample());
        assert_eq!(report.total_hits, 9);
        assert_eq!(
            report.top_sections,
            vec![
                SectionHits {
                    section: "api".into(),
                    hits: 6
                },
                SectionHits {
                    section: "report".into(),
                    hits: 3
                },
            ]
        );
    }

    #[test]
    fn most_hit_details() {
        let report = summarize(1549573860, 10, &sample());
        let rows: Vec<(&str, &str, &str, usize)> = report
            .top_details
            .iter()
            .map(|d| {
                (
                    d.section.as_str(),
                    d.method.as_str(),
                    d.remote_host.as_str(),
                    d.count,
                )
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                ("api", "GET", "10.0.0.4", 3),
                ("api", "GET", "10.0.0.2", 2),
                ("api", "GET", "10.0.0.5", 1),
                ("report", "GET", "10.0.0.3", 1),
                ("report", "POST", "10.0.0.3", 1),
            ]
        );
    }

    #[test]
    fn error_statuses() {
        let report = summarize(1549573860, 10, &sample());
        assert_eq!(
            report.top_errors,
            vec![ErrorHits {
                status: 500,
                remote_host: "10.0.0.5".into(),
                count: 1
            }]
        );
    }

    #[test]
    fn byte_stats() {
        let stats = ByteStats::from_records(&sample());
        assert_eq!(stats.max, 1307);
        assert!((stats.mean - 1237.666_666).abs() < 1e-3);
        let std = stats.std_dev.expect("more than one record");
        assert!((std - 29.171_904).abs() < 1e-3);
    }

    #[test]
    fn single_record_has_no_std_dev() {
        let stats = ByteStats::from_records(&sample()[..1]);
        assert_eq!(stats.mean, 1234.0);
        assert_eq!(stats.std_dev, None);
        assert_eq!(stats.max, 1234);
    }

    #[test]
    fn empty_interval() {
        let report = summarize(0, 10, &[]);
        assert_eq!(report.total_hits, 0);
        assert!(report.top_sections.is_empty());
        assert_eq!(report.bytes.max, 0);
    }

    #[test]
    fn report_serializes() {
        let report = summarize(1549573860, 10, &sample()[6..7]);
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["top_errors"][0]["status"], 500);
        assert_eq!(json["bytes"]["std_dev"], serde_json::Value::Null);
    }
}
