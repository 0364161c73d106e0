//! Shared output formatting for check reports and document outlines.
//!
//! Plain JSON and text only; color belongs to the CLI layer.

use std::io::Write;

use crate::model::{Block, Document};
use crate::report::{Report, Severity};

const RULE_WIDTH: usize = 80;

/// Write a `Report` as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(report: &Report, writer: &mut dyn Write) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Write a `Report` as plain text, grouped by severity.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human(report: &Report, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(writer, "  GUIDE CONSISTENCY REPORT")?;
    writeln!(writer, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(writer)?;
    writeln!(writer, "  Documents scanned: {}", report.documents_scanned)?;
    writeln!(writer, "  Documents failed:  {}", report.documents_failed)?;
    writeln!(writer, "  Snippets checked:  {}", report.snippets_checked)?;
    writeln!(
        writer,
        "  Findings:          {} error(s), {} warning(s), {} info",
        report.counts.errors, report.counts.warnings, report.counts.infos
    )?;
    writeln!(writer)?;

    for (severity, title) in [
        (Severity::Error, "ERRORS"),
        (Severity::Warning, "WARNINGS"),
        (Severity::Info, "NOTES"),
    ] {
        let mut group = report
            .findings
            .iter()
            .filter(|f| f.severity == severity)
            .peekable();
        if group.peek().is_none() {
            continue;
        }
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(writer, "  {title}")?;
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;
        for finding in group {
            writeln!(writer, "{}", finding.format_human_readable())?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "{}", "=".repeat(RULE_WIDTH))?;
    if report.ok {
        writeln!(
            writer,
            "\u{2713} {} document(s) consistent",
            report.documents_scanned
        )?;
    } else {
        writeln!(
            writer,
            "\u{2717} {} error finding(s) across {} document(s)",
            report.counts.errors,
            report.documents_attempted()
        )?;
    }
    writeln!(writer, "{}", "=".repeat(RULE_WIDTH))?;

    Ok(())
}

/// Write the section tree of one document: one line per section with its
/// anchor and the language tags of its snippets.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_outline(document: &Document, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(writer, "{} (variant {})", document.id, document.variant)?;
    for section in &document.sections {
        let tags: Vec<&str> = section
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Snippet(snippet) if snippet.language.is_empty() => Some("?"),
                Block::Snippet(snippet) => Some(snippet.language.as_str()),
                Block::Prose { .. } => None,
            })
            .collect();
        let indent = "  ".repeat(usize::from(section.depth));
        let title = if section.depth == 0 {
            "(preamble)"
        } else {
            section.title.as_str()
        };
        if tags.is_empty() {
            writeln!(writer, "{indent}{title} #{} L{}", section.anchor, section.line)?;
        } else {
            writeln!(
                writer,
                "{indent}{title} #{} L{} [{}]",
                section.anchor,
                section.line,
                tags.join(", ")
            )?;
        }
    }
    Ok(())
}
