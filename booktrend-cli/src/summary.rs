//! Console summaries for ingestion runs, reports, and resets.

use std::io::Write;

use booktrend_analysis::ReportArtifacts;
use booktrend_core::{IngestReport, ResetSummary};

use crate::CliError;

pub(crate) fn line(out: &mut dyn Write, text: &str) -> Result<(), CliError> {
    writeln!(out, "{text}").map_err(CliError::WriteOutput)
}

/// Describe one ingestion run.
pub(crate) fn ingest_summary(report: &IngestReport) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{} ({}): inserted {} of {} new books in {} page(s); stopped: {}",
            report.genre,
            report.source,
            report.inserted,
            report.goal,
            report.pages_fetched,
            report.stop,
        ),
        format!(
            "  seen {} records, {} duplicate titles, {} left over",
            report.records_seen, report.duplicates, report.trimmed,
        ),
    ];
    if report.rejected.total() > 0 {
        let reasons: Vec<_> = report
            .rejected
            .iter()
            .map(|(kind, count)| format!("{kind} {count}"))
            .collect();
        lines.push(format!(
            "  skipped {} records: {}",
            report.rejected.total(),
            reasons.join(", "),
        ));
    }
    if !report.goal_met() {
        lines.push(format!(
            "  goal not met: {} short of {}",
            report.goal.saturating_sub(report.inserted),
            report.goal,
        ));
    }
    lines
}

/// Describe the files written for one genre.
pub(crate) fn report_summary(artifacts: &ReportArtifacts) -> Vec<String> {
    let analysis = &artifacts.analysis;
    let mut lines = vec![format!(
        "{}: {} stored books; calculations written to {}",
        analysis.genre, analysis.total_books, artifacts.csv_path,
    )];
    lines.extend(
        artifacts
            .charts
            .iter()
            .map(|path| format!("  chart saved to {path}")),
    );
    lines.extend(
        artifacts
            .skipped
            .iter()
            .map(|kind| format!("  no data available for the {kind} chart")),
    );
    lines
}

pub(crate) fn reset_summary(summary: ResetSummary) -> String {
    format!(
        "Database cleared: removed {} books and {} genres.",
        summary.books_removed, summary.genres_removed,
    )
}

pub(crate) fn write_lines(out: &mut dyn Write, lines: &[String]) -> Result<(), CliError> {
    for text in lines {
        line(out, text)?;
    }
    Ok(())
}
