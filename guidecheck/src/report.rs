//! Findings and the aggregated report.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ParseError, ScanError};
use crate::model::{Document, PREAMBLE_ANCHOR, Section};

/// How serious a finding is. Ordered `Info < Warning < Error`.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only.
    Info,
    /// Worth a look; does not fail the run unless promoted.
    #[default]
    Warning,
    /// Fails the run.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

impl FromStr for Severity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::UnknownSeverity(s.to_owned())),
        }
    }
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FindingKind {
    /// The document could not be parsed (e.g. an unterminated fence).
    ParseError,
    /// A snippet failed the syntax check for its language.
    SyntaxError,
    /// Sections differ between variants.
    StructuralDrift,
    /// A snippet's language tag is missing or not recognized.
    UnknownLanguage,
    /// The file could not be read.
    Unreadable,
    /// Snippet validation hit the per-document time budget.
    BudgetExceeded,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ParseError => "parse_error",
            Self::SyntaxError => "syntax_error",
            Self::StructuralDrift => "structural_drift",
            Self::UnknownLanguage => "unknown_language",
            Self::Unreadable => "unreadable",
            Self::BudgetExceeded => "budget_exceeded",
        })
    }
}

/// The flavor of a structural drift finding.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum DriftKind {
    /// The reference has a section the variant lacks.
    MissingInVariant,
    /// The variant has a section the reference lacks.
    ExtraInVariant,
    /// Matched only by title similarity.
    Renamed,
    /// Matched, but out of order relative to the reference.
    Reordered,
    /// Matched, but at a different heading level.
    DepthChanged,
}

/// Where a finding points: a document, a section anchor in it and a line.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    /// Document id.
    pub document: String,
    /// Section anchor (empty for the preamble).
    pub section: String,
    /// 1-indexed line in the document.
    pub line: usize,
}

impl Location {
    /// Location of a section heading.
    #[must_use]
    pub fn of_section(document: &Document, section: &Section) -> Self {
        Self {
            document: document.id.clone(),
            section: section.anchor.clone(),
            line: section.line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.section.is_empty() {
            write!(f, "{}:{}", self.document, self.line)
        } else {
            write!(f, "{}:{} (#{})", self.document, self.line, self.section)
        }
    }
}

/// A single reported issue.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct Finding {
    /// Severity.
    pub severity: Severity,
    /// Category.
    pub kind: FindingKind,
    /// Drift flavor, only for [`FindingKind::StructuralDrift`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift: Option<DriftKind>,
    /// Human-readable description.
    pub message: String,
    /// Primary location.
    pub location: Location,
    /// Counterpart in the reference variant, for drift findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<Location>,
}

impl Finding {
    /// A plain finding with no drift flavor or related location.
    #[must_use]
    pub fn new(severity: Severity, kind: FindingKind, message: String, location: Location) -> Self {
        Self {
            severity,
            kind,
            drift: None,
            message,
            location,
            related: None,
        }
    }

    /// A structural drift finding.
    #[must_use]
    pub fn drift(
        severity: Severity,
        drift: DriftKind,
        message: String,
        location: Location,
        related: Option<Location>,
    ) -> Self {
        Self {
            severity,
            kind: FindingKind::StructuralDrift,
            drift: Some(drift),
            message,
            location,
            related,
        }
    }

    /// An error finding for a document that failed to parse.
    #[must_use]
    pub fn parse_error(document_id: &str, err: &ParseError) -> Self {
        Self::new(
            Severity::Error,
            FindingKind::ParseError,
            err.to_string(),
            Location {
                document: document_id.to_owned(),
                section: PREAMBLE_ANCHOR.to_owned(),
                line: err.line(),
            },
        )
    }

    /// An error finding for a file that could not be read.
    #[must_use]
    pub fn unreadable(document_id: &str, err: &ScanError) -> Self {
        Self::new(
            Severity::Error,
            FindingKind::Unreadable,
            err.message.clone(),
            Location {
                document: document_id.to_owned(),
                section: PREAMBLE_ANCHOR.to_owned(),
                line: 1,
            },
        )
    }

    /// Format the finding for human-readable output:
    /// `{location}: {severity}[{kind}] {message}`.
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        let base = format!(
            "{}: {}[{}] {}",
            self.location, self.severity, self.kind, self.message
        );
        match &self.related {
            Some(related) => format!("{base} (see {related})"),
            None => base,
        }
    }

    /// Report order: severity descending, then document, line, section,
    /// kind and message so that ties never depend on discovery order.
    fn report_order(&self, other: &Self) -> Ordering {
        other
            .severity
            .cmp(&self.severity)
            .then_with(|| self.location.document.cmp(&other.location.document))
            .then_with(|| self.location.line.cmp(&other.location.line))
            .then_with(|| self.location.section.cmp(&other.location.section))
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.drift.cmp(&other.drift))
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.related.cmp(&other.related))
    }
}

/// Per-severity totals.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SeverityCounts {
    /// Error findings.
    pub errors: usize,
    /// Warning findings.
    pub warnings: usize,
    /// Info findings.
    pub infos: usize,
}

impl SeverityCounts {
    fn tally(findings: &[Finding]) -> Self {
        findings.iter().fold(Self::default(), |mut acc, f| {
            match f.severity {
                Severity::Error => acc.errors += 1,
                Severity::Warning => acc.warnings += 1,
                Severity::Info => acc.infos += 1,
            }
            acc
        })
    }
}

/// Result of a check run.
///
/// Contains no timestamps or durations, so identical input serializes to
/// identical JSON.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct Report {
    /// Documents that were read and parsed.
    pub documents_scanned: usize,
    /// Documents that could not be read or parsed.
    pub documents_failed: usize,
    /// Snippets that went through a syntax check.
    pub snippets_checked: usize,
    /// Whether the report contains no error findings.
    pub ok: bool,
    /// Totals per severity.
    pub counts: SeverityCounts,
    /// All findings, sorted.
    pub findings: Vec<Finding>,
}

impl Report {
    /// Total number of documents attempted (scanned + failed).
    #[must_use]
    pub fn documents_attempted(&self) -> usize {
        self.documents_scanned + self.documents_failed
    }

    /// Number of error findings.
    #[must_use]
    pub fn errors_count(&self) -> usize {
        self.counts.errors
    }

    /// Process exit code: 0 without error findings, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.ok)
    }

    /// Findings of the given kind, in report order.
    pub fn findings_of(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }

    /// Turn every warning into an error (strict mode) and re-sort.
    pub fn promote_warnings(&mut self) {
        for finding in &mut self.findings {
            if finding.severity == Severity::Warning {
                finding.severity = Severity::Error;
            }
        }
        self.findings.sort_by(Finding::report_order);
        self.counts = SeverityCounts::tally(&self.findings);
        self.ok = self.counts.errors == 0;
    }
}

/// Accumulates findings and counters, then folds them into a [`Report`].
#[derive(Debug, Default)]
pub struct ReportBuilder {
    documents_scanned: usize,
    documents_failed: usize,
    snippets_checked: usize,
    findings: Vec<Finding>,
}

impl ReportBuilder {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a document that was read and parsed.
    pub fn document_scanned(&mut self) {
        self.documents_scanned += 1;
    }

    /// Count a document that could not be read or parsed.
    pub fn document_failed(&mut self) {
        self.documents_failed += 1;
    }

    /// Count snippets that went through a syntax check.
    pub fn snippets_checked(&mut self, count: usize) {
        self.snippets_checked += count;
    }

    /// Record one finding.
    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Sort the findings and produce the report.
    #[must_use]
    pub fn build(mut self) -> Report {
        self.findings.sort_by(Finding::report_order);
        let counts = SeverityCounts::tally(&self.findings);
        Report {
            documents_scanned: self.documents_scanned,
            documents_failed: self.documents_failed,
            snippets_checked: self.snippets_checked,
            ok: counts.errors == 0,
            counts,
            findings: self.findings,
        }
    }
}

impl Extend<Finding> for ReportBuilder {
    fn extend<T: IntoIterator<Item = Finding>>(&mut self, iter: T) {
        self.findings.extend(iter);
    }
}
