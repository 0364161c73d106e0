//! Colored terminal rendering of a report.

use std::io::Write;

use colored::{ColoredString, Colorize};
use guidecheck::{Finding, Report, Severity};

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Info => "info".blue().bold(),
    }
}

fn write_finding(finding: &Finding, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(
        writer,
        "{}: {}[{}] {}",
        finding.location.to_string().bold(),
        severity_label(finding.severity),
        finding.kind,
        finding.message
    )?;
    if let Some(related) = &finding.related {
        writeln!(writer, "    {} {related}", "see".dimmed())?;
    }
    Ok(())
}

/// Write findings one per line followed by a summary line.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_colored(report: &Report, writer: &mut dyn Write) -> anyhow::Result<()> {
    for finding in &report.findings {
        write_finding(finding, writer)?;
    }
    if !report.findings.is_empty() {
        writeln!(writer)?;
    }

    let summary = format!(
        "{} document(s), {} snippet(s) checked: {} error(s), {} warning(s), {} info",
        report.documents_attempted(),
        report.snippets_checked,
        report.counts.errors,
        report.counts.warnings,
        report.counts.infos
    );
    if report.ok {
        writeln!(writer, "{} {}", "\u{2713}".green().bold(), summary.bold())?;
    } else {
        writeln!(writer, "{} {}", "\u{2717}".red().bold(), summary.bold())?;
    }
    Ok(())
}
