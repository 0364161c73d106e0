//! Document source strategies.
//!
//! Only the filesystem strategy (`fs` module) exists. Callers holding
//! documents in memory build `SourceDocument`s themselves and go through
//! `check_sources()`.

use std::path::PathBuf;

pub mod fs;

/// One loaded Markdown file, before extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct SourceDocument {
    /// Stable identifier used in findings (relative path for files on disk).
    pub id: String,
    /// Where the content came from, if it was read from disk.
    pub path: Option<PathBuf>,
    /// Full UTF-8 content.
    pub content: String,
}

impl SourceDocument {
    /// An in-memory document with no backing file.
    #[must_use]
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: None,
            content: content.into(),
        }
    }

    pub(crate) fn from_file(id: String, path: PathBuf, content: String) -> Self {
        Self {
            id,
            path: Some(path),
            content,
        }
    }
}
