//! YAML snippets.
//!
//! Multi-document streams are accepted. Values are discarded; only the
//! syntax matters.

use serde::de::IgnoredAny;

use super::{SyntaxChecker, SyntaxIssue};

/// Parses the snippet as a YAML stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlChecker;

impl SyntaxChecker for YamlChecker {
    fn check(&self, source: &str) -> Result<(), SyntaxIssue> {
        serde_saphyr::from_multiple::<IgnoredAny>(source)
            .map(|_| ())
            .map_err(|e| {
                let line = e.location().and_then(|l| usize::try_from(l.line()).ok());
                SyntaxIssue::new(format!("YAML parse error: {e}"), line)
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_yaml() {
        let src = "name: guide\nitems:\n  - a\n  - b\n---\nsecond: doc\n";
        assert!(YamlChecker.check(src).is_ok());
    }

    #[test]
    fn test_unclosed_flow_sequence() {
        let issue = YamlChecker.check("items: [a, b\nnext: 1\n").unwrap_err();
        assert!(issue.message.starts_with("YAML parse error"));
        assert!(issue.line.is_some());
    }

    #[test]
    fn test_error_line_is_reported() {
        let issue = YamlChecker
            .check("name: ok\nkey: value: nested\n")
            .unwrap_err();
        assert_eq!(issue.line, Some(2));
    }
}
