//! TOML snippets.

use super::{SyntaxChecker, SyntaxIssue, line_of_offset};

/// Parses the snippet as a TOML document.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlChecker;

impl SyntaxChecker for TomlChecker {
    fn check(&self, source: &str) -> Result<(), SyntaxIssue> {
        toml::from_str::<toml::Table>(source).map(|_| ()).map_err(|e| {
            let line = e.span().map(|span| line_of_offset(source, span.start));
            SyntaxIssue::new(format!("TOML parse error: {}", e.message()), line)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_toml() {
        let src = "[package]\nname = \"guide\"\n\n[dependencies]\nserde = \"1\"\n";
        assert!(TomlChecker.check(src).is_ok());
    }

    #[test]
    fn test_duplicate_key_reports_line() {
        let issue = TomlChecker.check("a = 1\nb = 2\na = 3\n").unwrap_err();
        assert_eq!(issue.line, Some(3));
    }
}
