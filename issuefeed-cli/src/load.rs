use anyhow::Result;
use issuefeed::{IssueStorage, LoadReport, MetricsSnapshot, PhaseReport};
use tabled::{settings::Style, Table, Tabled};

use crate::cli::OutputFormat;
use crate::error::CliResult;
use crate::session::Session;

#[derive(Tabled)]
struct PhaseRow {
    #[tabled(rename = "Phase")]
    phase: &'static str,
    #[tabled(rename = "Files")]
    files: usize,
    #[tabled(rename = "Skipped")]
    skipped: usize,
    #[tabled(rename = "Applied")]
    applied: usize,
    #[tabled(rename = "Dropped")]
    dropped: usize,
}

impl PhaseRow {
    fn new(phase: &'static str, report: &PhaseReport) -> Self {
        Self {
            phase,
            files: report.files_parsed,
            skipped: report.files_skipped,
            applied: report.entries_applied,
            dropped: report.comments_dropped,
        }
    }
}

#[derive(Tabled)]
struct TimingRow {
    #[tabled(rename = "Operation")]
    operation: &'static str,
    #[tabled(rename = "Count")]
    count: u64,
    #[tabled(rename = "Avg (µs)")]
    avg: String,
}

#[derive(serde::Serialize)]
struct LoadSummary {
    report: LoadReport,
    issues: usize,
    comments: usize,
    metrics: MetricsSnapshot,
}

fn render(summary: &LoadSummary, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(summary)?);
    }

    let phases = vec![
        PhaseRow::new("issues", &summary.report.issues),
        PhaseRow::new("comments", &summary.report.comments),
    ];
    let mut phase_table = Table::new(phases);
    phase_table.with(Style::modern());

    let m = &summary.metrics;
    let timings = [
        ("insert", m.insert_ops, m.avg_insert_time),
        ("attach", m.attach_ops, m.avg_attach_time),
        ("lookup", m.lookup_ops, m.avg_lookup_time),
        ("scan", m.scan_ops, m.avg_scan_time),
    ]
    .into_iter()
    .map(|(operation, count, avg)| TimingRow {
        operation,
        count,
        avg: format!("{avg:.1}"),
    });
    let mut timing_table = Table::new(timings);
    timing_table.with(Style::modern());

    Ok(format!(
        "Loaded {} issues with {} comments\n\n{}\n\n{}",
        summary.issues, summary.comments, phase_table, timing_table
    ))
}

/// Wait for the load and print what it did
pub async fn run_load_command(session: &mut Session, format: OutputFormat) -> CliResult<()> {
    let report = session.wait().await?;

    let summary = LoadSummary {
        report,
        issues: session.storage.len().await,
        comments: session.storage.comment_count().await,
        metrics: session.storage.get_metrics_snapshot(),
    };

    println!("{}", render(&summary, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuefeed::PerformanceMetrics;

    fn summary() -> LoadSummary {
        LoadSummary {
            report: LoadReport {
                issues: PhaseReport {
                    files_parsed: 2,
                    files_skipped: 1,
                    entries_applied: 5,
                    comments_dropped: 0,
                },
                comments: PhaseReport {
                    files_parsed: 1,
                    files_skipped: 0,
                    entries_applied: 3,
                    comments_dropped: 1,
                },
            },
            issues: 5,
            comments: 3,
            metrics: PerformanceMetrics::new().get_stats(),
        }
    }

    #[test]
    fn test_render_table() {
        let rendered = render(&summary(), OutputFormat::Table).unwrap();

        assert!(rendered.starts_with("Loaded 5 issues with 3 comments"));
        assert!(rendered.contains("comments"));
        assert!(rendered.contains("Skipped"));
        assert!(rendered.contains("attach"));
    }

    #[test]
    fn test_render_json() {
        let rendered = render(&summary(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["issues"], 5);
        assert_eq!(value["report"]["issues"]["files_skipped"], 1);
        assert_eq!(value["report"]["comments"]["comments_dropped"], 1);
        assert_eq!(value["metrics"]["insert_ops"], 0);
    }
}
