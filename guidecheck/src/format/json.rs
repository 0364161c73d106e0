//! JSON snippets.

use serde_json::Value;

use super::{SyntaxChecker, SyntaxIssue};

/// Parses the snippet as a single JSON value.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonChecker;

impl SyntaxChecker for JsonChecker {
    fn check(&self, source: &str) -> Result<(), SyntaxIssue> {
        serde_json::from_str::<Value>(source)
            .map(|_| ())
            .map_err(|e| SyntaxIssue::new(format!("JSON parse error: {e}"), Some(e.line())))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_json() {
        assert!(JsonChecker.check(r#"{"name": "x", "tags": [1, 2]}"#).is_ok());
    }

    #[test]
    fn test_trailing_comma_reports_line() {
        let issue = JsonChecker.check("{\n  \"a\": 1,\n}\n").unwrap_err();
        assert_eq!(issue.line, Some(3));
        assert!(issue.message.starts_with("JSON parse error"));
    }
}
