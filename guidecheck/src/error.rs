//! Error types for guide loading and parsing.

use std::path::PathBuf;

use thiserror::Error;

/// A document could not be turned into sections and snippets.
///
/// Fatal for that document only; the run continues with the others.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// End of input was reached inside a fenced code block.
    #[error("unterminated code fence `{fence}` opened at line {line}")]
    UnterminatedFence {
        /// 1-indexed line of the opening fence.
        line: usize,
        /// The opening fence marker (e.g. "```" or "~~~~").
        fence: String,
    },
}

impl ParseError {
    /// 1-indexed line the error points at.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::UnterminatedFence { line, .. } => *line,
        }
    }
}

/// An invalid configuration value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A severity name other than `info`, `warning` or `error`.
    #[error("unknown severity '{0}' (expected info, warning or error)")]
    UnknownSeverity(String),
}

/// The kind of scan-level failure that prevented a file from being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScanErrorKind {
    /// An I/O error occurred while reading the file.
    IoError,
    /// The file exceeded the configured maximum size limit.
    FileTooLarge,
    /// The file content is not valid UTF-8.
    InvalidEncoding,
    /// The resolved path is outside the scan root (symlink escape).
    OutsideRoot,
    /// A resource limit (`max_files` or `max_total_bytes`) was reached, truncating the scan.
    LimitExceeded,
    /// A directory traversal error (permission denied, loop detected, etc.).
    WalkError,
}

/// A file that could not be read at all.
///
/// Turned into an `unreadable` finding so it shows up in the report
/// instead of being silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ScanError {
    /// The file path that could not be scanned.
    pub file: PathBuf,
    /// The kind of failure.
    pub kind: ScanErrorKind,
    /// Human-readable description of the failure.
    pub message: String,
}

impl ScanError {
    pub(crate) fn new(file: PathBuf, kind: ScanErrorKind, message: String) -> Self {
        Self {
            file,
            kind,
            message,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::UnterminatedFence {
            line: 12,
            fence: "```".to_owned(),
        };
        assert_eq!(err.line(), 12);
        let msg = err.to_string();
        assert!(msg.starts_with("unterminated code fence"), "got: {msg}");
        assert!(msg.ends_with("opened at line 12"), "got: {msg}");
    }
}
