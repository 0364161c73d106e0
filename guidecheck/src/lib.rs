//! # guidecheck
//!
//! Consistency checker for style guides that exist as several Markdown
//! variants (one per language or translation).
//!
//! A check run extracts sections and fenced snippets from every variant,
//! syntax-checks the snippets, aligns each variant's section tree against a
//! reference variant, and folds everything into one sorted [`Report`].
//!
//! The core pipeline ([`check_sources`]) is input-agnostic; [`check_fs`]
//! adds filesystem discovery on top.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use guidecheck::{CheckConfig, FsSourceConfig, check_fs};
//!
//! let mut fs_config = FsSourceConfig::default();
//! fs_config.paths = vec![PathBuf::from("guides")];
//! fs_config.exclude = vec!["drafts/*".to_owned()];
//!
//! let mut check_config = CheckConfig::default();
//! check_config.reference = Some("en".to_owned());
//!
//! let report = check_fs(&fs_config, &check_config).unwrap();
//! println!("Documents scanned: {}", report.documents_scanned);
//! println!("Errors: {}", report.errors_count());
//! println!("OK: {}", report.ok);
//! ```

mod align;
mod config;
mod error;
mod extract;
pub mod format;
mod model;
pub mod output;
mod report;
mod strategy;
mod validator;

pub use align::{align_documents, align_pair};
pub use config::{CheckConfig, FsSourceConfig};
pub use error::{ConfigError, ParseError, ScanError, ScanErrorKind};
pub use extract::extract_document;
pub use model::{Block, Document, PREAMBLE_ANCHOR, Section, Snippet, slugify};
pub use report::{
    DriftKind, Finding, FindingKind, Location, Report, ReportBuilder, Severity, SeverityCounts,
};
pub use strategy::SourceDocument;
pub use validator::{
    LanguageInfo, LanguageLookup, LanguageRegistry, ValidationOutcome, validate_document,
    validate_documents, validate_snippet,
};

use strategy::fs::{find_files, read_file_bounded};
use tracing::{debug, info, warn};

/// Check the Markdown guides found under `fs_config.paths`.
///
/// # Errors
///
/// Returns an error if `fs_config.paths` is empty, a path does not exist, an
/// exclude pattern is invalid, or no Markdown file is found. Files that are
/// found but cannot be read become `unreadable` findings instead.
pub fn check_fs(fs_config: &FsSourceConfig, check_config: &CheckConfig) -> anyhow::Result<Report> {
    if fs_config.paths.is_empty() {
        anyhow::bail!("No paths provided for checking");
    }

    for path in &fs_config.paths {
        if !path.exists() {
            anyhow::bail!("Path does not exist: {}", path.display());
        }
    }

    let (files, skipped) = find_files(fs_config)?;
    if files.is_empty() && skipped.is_empty() {
        anyhow::bail!("No Markdown files found in the given paths");
    }

    let mut sources = Vec::with_capacity(files.len());
    let mut unreadable = Vec::new();
    for skip in skipped {
        warn!(file = %skip.error.file.display(), "{}", skip.error.message);
        unreadable.push(Finding::unreadable(&skip.id, &skip.error));
    }

    let mut total_bytes: u64 = 0;
    for file in &files {
        if sources.len() + unreadable.len() >= fs_config.max_files {
            let err = ScanError::new(
                file.path.clone(),
                ScanErrorKind::LimitExceeded,
                format!(
                    "Scan aborted: max_files limit ({}) reached; remaining files not loaded",
                    fs_config.max_files
                ),
            );
            warn!(file = %file.id, "{}", err.message);
            unreadable.push(Finding::unreadable(&file.id, &err));
            break;
        }

        let content = match read_file_bounded(&file.path, fs_config.max_file_size) {
            Ok(content) => content,
            Err(err) => {
                warn!(file = %file.id, "{}", err.message);
                unreadable.push(Finding::unreadable(&file.id, &err));
                continue;
            }
        };

        let file_bytes = content.len() as u64;
        if total_bytes.saturating_add(file_bytes) > fs_config.max_total_bytes {
            let err = ScanError::new(
                file.path.clone(),
                ScanErrorKind::LimitExceeded,
                format!(
                    "Scan aborted: max_total_bytes limit ({}) reached; remaining files not loaded",
                    fs_config.max_total_bytes
                ),
            );
            warn!(file = %file.id, "{}", err.message);
            unreadable.push(Finding::unreadable(&file.id, &err));
            break;
        }
        total_bytes = total_bytes.saturating_add(file_bytes);

        sources.push(SourceDocument::from_file(
            file.id.clone(),
            file.path.clone(),
            content,
        ));
    }

    let mut builder = ReportBuilder::new();
    for finding in unreadable {
        builder.document_failed();
        builder.push(finding);
    }
    Ok(run_pipeline(&sources, check_config, builder))
}

/// Check documents that are already in memory.
///
/// Documents are processed in id order regardless of the slice order, so the
/// default reference variant is the one with the smallest id.
#[must_use]
pub fn check_sources(sources: &[SourceDocument], check_config: &CheckConfig) -> Report {
    run_pipeline(sources, check_config, ReportBuilder::new())
}

fn run_pipeline(
    sources: &[SourceDocument],
    check_config: &CheckConfig,
    mut builder: ReportBuilder,
) -> Report {
    let mut ordered: Vec<&SourceDocument> = sources.iter().collect();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));

    let mut documents = Vec::with_capacity(ordered.len());
    for source in ordered {
        match extract_document(&source.id, &source.content) {
            Ok(document) => {
                debug!(
                    document = %document.id,
                    sections = document.sections.len(),
                    "extracted"
                );
                builder.document_scanned();
                documents.push(document);
            }
            Err(err) => {
                warn!(document = %source.id, error = %err, "document skipped");
                builder.document_failed();
                builder.push(Finding::parse_error(&source.id, &err));
            }
        }
    }

    let registry = LanguageRegistry::for_config(check_config);
    let (validation, drift) = rayon::join(
        || {
            if check_config.validate_snippets {
                validate_documents(&documents, &registry, check_config)
            } else {
                ValidationOutcome::default()
            }
        },
        || {
            if check_config.align_sections {
                align_documents(&documents, check_config)
            } else {
                Vec::new()
            }
        },
    );

    builder.snippets_checked(validation.snippets_checked);
    builder.extend(validation.findings);
    builder.extend(drift);
    let report = builder.build();

    info!(
        scanned = report.documents_scanned,
        failed = report.documents_failed,
        snippets = report.snippets_checked,
        errors = report.counts.errors,
        warnings = report.counts.warnings,
        "check complete"
    );
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const EN: &str = "\
# Guide

## Config

```json
{\"name\": \"demo\"}
```

## Naming

Short names.
";

    #[test]
    fn test_check_sources_clean() {
        let sources = [SourceDocument::new("en.md", EN), SourceDocument::new("fr.md", EN)];
        let report = check_sources(&sources, &CheckConfig::default());
        assert!(report.ok);
        assert!(report.findings.is_empty(), "{:?}", report.findings);
        assert_eq!(report.documents_scanned, 2);
        assert_eq!(report.snippets_checked, 2);
    }

    #[test]
    fn test_check_sources_orders_by_id() {
        let partial = EN.replace("## Naming\n\nShort names.\n", "");
        // "a.md" becomes the reference even though it is passed second.
        let sources = [SourceDocument::new("b.md", EN), SourceDocument::new("a.md", &partial)];
        let report = check_sources(&sources, &CheckConfig::default());
        let drift: Vec<&Finding> = report.findings_of(FindingKind::StructuralDrift).collect();
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].drift, Some(DriftKind::ExtraInVariant));
        assert_eq!(drift[0].location.document, "b.md");
    }

    #[test]
    fn test_stages_can_be_disabled() {
        let broken = EN.replace("{\"name\": \"demo\"}", "{\"name\": }");
        let sources = [
            SourceDocument::new("en.md", EN),
            SourceDocument::new("fr.md", &broken.replace("## Naming", "## Other things")),
        ];

        let mut config = CheckConfig::default();
        config.validate_snippets = false;
        config.align_sections = false;
        let report = check_sources(&sources, &config);
        assert!(report.findings.is_empty(), "{:?}", report.findings);
        assert_eq!(report.snippets_checked, 0);

        let report = check_sources(&sources, &CheckConfig::default());
        assert_eq!(report.findings_of(FindingKind::SyntaxError).count(), 1);
        assert!(report.findings_of(FindingKind::StructuralDrift).count() > 0);
    }

    #[test]
    fn test_parse_error_does_not_stop_the_run() {
        let sources = [
            SourceDocument::new("en.md", EN),
            SourceDocument::new("fr.md", "# Guide\n\n```rust\nfn main() {}\n"),
        ];
        let report = check_sources(&sources, &CheckConfig::default());
        assert_eq!(report.documents_scanned, 1);
        assert_eq!(report.documents_failed, 1);
        let parse: Vec<&Finding> = report.findings_of(FindingKind::ParseError).collect();
        assert_eq!(parse.len(), 1);
        assert_eq!(parse[0].location.document, "fr.md");
        assert_eq!(parse[0].location.line, 3);
        assert!(!report.ok);
    }
}
