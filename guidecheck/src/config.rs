//! Configuration types for guide checking.
//!
//! Split into core check config (universal) and source-specific config
//! (how documents are discovered). This keeps filesystem concerns out of
//! the core API.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::report::Severity;

/// Core check config, independent of where documents come from.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct CheckConfig {
    /// Variant the others are aligned against, matched against the document
    /// id or variant name. `None` picks the first document in id order.
    pub reference: Option<String>,
    /// Fuzzy title matches must have an edit distance strictly below this.
    pub fuzzy_threshold: usize,
    /// Severity of missing/extra/reordered/depth drift findings.
    /// Renames found by the fuzzy pass are always `info`.
    pub drift_severity: Severity,
    /// Extra language tags that are recognized but never checked.
    pub skip_languages: Vec<String>,
    /// Extra tag aliases, alias -> canonical language name.
    pub language_aliases: BTreeMap<String, String>,
    /// Report snippets without a language tag as `unknown_language`.
    pub report_untagged: bool,
    /// Wall-clock budget for validating the snippets of one document.
    pub document_budget: Duration,
    /// Run the snippet validator.
    pub validate_snippets: bool,
    /// Run the section aligner.
    pub align_sections: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            reference: None,
            fuzzy_threshold: 4,
            drift_severity: Severity::Warning,
            skip_languages: Vec::new(),
            language_aliases: BTreeMap::new(),
            report_untagged: true,
            document_budget: Duration::from_secs(10),
            validate_snippets: true,
            align_sections: true,
        }
    }
}

/// Filesystem-specific source options.
///
/// NOTE: `paths` is required and must be non-empty. Default scan roots are a
/// CLI concern, not baked into the library.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct FsSourceConfig {
    /// Paths to scan (files or directories). Required, must be non-empty.
    pub paths: Vec<PathBuf>,
    /// Exclude patterns (glob format).
    pub exclude: Vec<String>,
    /// Maximum file size in bytes (default: 10 MB).
    pub max_file_size: u64,
    /// Whether to follow symbolic links (default: `false`).
    pub follow_links: bool,
    /// Maximum directory traversal depth (default: 64).
    pub max_depth: usize,
    /// Maximum total number of files to load (default: `10_000`).
    pub max_files: usize,
    /// Maximum total bytes to read across all files (default: 256 MB).
    pub max_total_bytes: u64,
}

impl Default for FsSourceConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            exclude: Vec::new(),
            max_file_size: 10_485_760,
            follow_links: false,
            max_depth: 64,
            max_files: 10_000,
            max_total_bytes: 268_435_456,
        }
    }
}
