//! Text rendering for alerts and interval reports.

use std::fmt;

use chrono::DateTime;
use hitwatch_core::AlertEvent;
use hitwatch_report::{IntervalOutcome, TrafficReport};

use crate::pipeline::PipelineEvent;

/// `YYYY-MM-DD HH:MM:SS` in UTC; falls back to the raw number when the
/// timestamp is outside chrono's range.
pub fn format_time(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

pub fn render_event(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::Alert(alert) => render_alert(alert),
        PipelineEvent::Interval(outcome) => render_outcome(outcome),
    }
}

pub fn render_alert(event: &AlertEvent) -> String {
    match event {
        AlertEvent::Start { hits, time } => format!(
            "High traffic generated an alert\nhits:\t{hits} ({:.2}/sec)\ntime:\t{}\n",
            event.rate(),
            format_time(*time)
        ),
        AlertEvent::End { time, .. } => {
            format!("Alert ended at time: {}\n", format_time(*time))
        }
    }
}

pub fn render_outcome(outcome: &IntervalOutcome) -> String {
    match outcome {
        IntervalOutcome::Report(report) => render_report(report),
        IntervalOutcome::Quiet { start, intervals: 1 } => {
            format!("No errors to log at time {start}.\n")
        }
        IntervalOutcome::Quiet { start, intervals } => {
            format!("No errors to log for {intervals} intervals from time {start}.\n")
        }
    }
}

pub fn render_report(report: &TrafficReport) -> String {
    ReportBlock(report).to_string()
}

/// Multi-line text form of one interval report.
struct ReportBlock<'a>(&'a TrafficReport);

impl fmt::Display for ReportBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "{}-Second Report", report.interval_secs)?;
        writeln!(f, "Start time: {}", format_time(report.start))?;
        writeln!(f, "Total number of hits: {}", report.total_hits)?;

        writeln!(f, "\nMost hits:")?;
        for (i, s) in report.top_sections.iter().enumerate() {
            writeln!(f, "({}) {}: {}", i + 1, s.section, s.hits)?;
        }

        writeln!(f, "\nTop {} most hits details:", report.top_details.len())?;
        for d in &report.top_details {
            writeln!(
                f,
                "{:<10} {:<6} {:<15} {}",
                d.section, d.method, d.remote_host, d.count
            )?;
        }

        writeln!(f, "\nTop errors by status code:")?;
        if report.top_errors.is_empty() {
            writeln!(f, "none")?;
        }
        for (i, e) in report.top_errors.iter().enumerate() {
            writeln!(f, "({}) {} {:<15} {}", i + 1, e.status, e.remote_host, e.count)?;
        }

        writeln!(f, "\nBytes Load:")?;
        writeln!(f, "mean:\t{:.2}", report.bytes.mean)?;
        match report.bytes.std_dev {
            Some(std) => writeln!(f, "std:\t{std:.2}")?,
            None => writeln!(f, "std:\tn/a")?,
        }
        writeln!(f, "max:\t{}", report.bytes.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hitwatch_report::{ByteStats, DetailHits, ErrorHits, SectionHits};

    #[test]
    fn formats_utc_time() {
        assert_eq!(format_time(1_549_573_860), "2019-02-07 21:11:00");
        assert_eq!(format_time(i64::MAX), i64::MAX.to_string());
    }

    #[test]
    fn alert_start_block() {
        let text = render_alert(&AlertEvent::Start {
            hits: 1201,
            time: 1_549_573_860,
        });
        assert_eq!(
            text,
            "High traffic generated an alert\nhits:\t1201 (10.01/sec)\ntime:\t2019-02-07 21:11:00\n"
        );
    }

    #[test]
    fn alert_end_line() {
        let text = render_alert(&AlertEvent::End {
            hits: 1,
            time: 1_549_573_980,
        });
        assert_eq!(text, "Alert ended at time: 2019-02-07 21:13:00\n");
    }

    #[test]
    fn quiet_intervals() {
        assert_eq!(
            render_outcome(&IntervalOutcome::Quiet {
                start: 100,
                intervals: 1
            }),
            "No errors to log at time 100.\n"
        );
        assert_eq!(
            render_outcome(&IntervalOutcome::Quiet {
                start: 100,
                intervals: 3
            }),
            "No errors to log for 3 intervals from time 100.\n"
        );
    }

    #[test]
    fn report_block() {
        let report = TrafficReport {
            start: 1_549_573_860,
            interval_secs: 10,
            total_hits: 2,
            top_sections: vec![SectionHits {
                section: "api".into(),
                hits: 2,
            }],
            top_details: Vec::new(),
            top_errors: vec![ErrorHits {
                status: 500,
                remote_host: "10.0.0.5".into(),
                count: 1,
            }],
            bytes: ByteStats {
                mean: 1270.5,
                std_dev: None,
                max: 1307,
            },
        };
        let text = render_report(&report);
        assert!(text.starts_with("10-Second Report\nStart time: 2019-02-07 21:11:00\n"));
        assert!(text.contains("Total number of hits: 2\n"));
        assert!(text.contains("(1) api: 2\n"));
        assert!(text.contains("(1) 500 10.0.0.5"));
        assert!(text.contains("mean:\t1270.50\n"));
        assert!(text.contains("std:\tn/a\n"));
        assert!(text.ends_with("max:\t1307\n"));
    }

    #[test]
    fn report_lists_details_and_sample_std() {
        let report = TrafficReport {
            start: 1_549_573_860,
            interval_secs: 30,
            total_hits: 3,
            top_sections: vec![SectionHits {
                section: "report".into(),
                hits: 3,
            }],
            top_details: vec![DetailHits {
                section: "report".into(),
                method: "GET".into(),
                remote_host: "10.0.0.4".into(),
                count: 3,
            }],
            top_errors: Vec::new(),
            bytes: ByteStats {
                mean: 1200.0,
                std_dev: Some(12.5),
                max: 1215,
            },
        };
        let text = render_report(&report);
        assert!(text.starts_with("30-Second Report\n"));
        assert!(text.contains("Top 1 most hits details:\nreport     GET    10.0.0.4        3\n"));
        assert!(text.contains("Top errors by status code:\nnone\n"));
        assert!(text.contains("std:\t12.50\n"));
    }
}
