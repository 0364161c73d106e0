//! Syntax-only checkers for snippet languages.
//!
//! Each sub-module covers one family:
//! - `json`: full JSON parse
//! - `yaml`: multi-document YAML parse
//! - `toml`: TOML table parse
//! - `rust`: `syn` file parse with a statement-block fallback for fragments
//! - `delimited`: lexical bracket/string/comment balance for C-family and
//!   scripting languages
//!
//! Nothing here executes code.

pub mod delimited;
pub mod json;
pub mod rust;
pub mod toml;
pub mod yaml;

use thiserror::Error;

/// A syntax problem found in a snippet.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SyntaxIssue {
    /// Human-readable description.
    pub message: String,
    /// 1-indexed line within the snippet, when the parser reports one.
    pub line: Option<usize>,
}

impl SyntaxIssue {
    /// Create an issue; a line of 0 means "unknown".
    #[must_use]
    pub fn new(message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            message: message.into(),
            line: line.filter(|&l| l > 0),
        }
    }
}

/// A syntax-only parser for one language.
pub trait SyntaxChecker: Send + Sync {
    /// Check `source` without executing it.
    ///
    /// # Errors
    ///
    /// Returns the first [`SyntaxIssue`] found.
    fn check(&self, source: &str) -> Result<(), SyntaxIssue>;
}

/// 1-indexed line of a byte offset.
pub(crate) fn line_of_offset(source: &str, offset: usize) -> usize {
    source
        .as_bytes()
        .iter()
        .take(offset)
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}
