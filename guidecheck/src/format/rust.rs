//! Rust snippets, parsed with `syn`.
//!
//! Guide examples are often fragments (a few statements, a bare expression)
//! rather than whole files, so a failed file parse is retried as the body of
//! a block before anything is reported.

use super::{SyntaxChecker, SyntaxIssue};

/// Parses the snippet as a Rust file, or failing that, as a block body.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustChecker;

impl SyntaxChecker for RustChecker {
    fn check(&self, source: &str) -> Result<(), SyntaxIssue> {
        let source = strip_hidden_lines(source);

        let file_err = match syn::parse_file(&source) {
            Ok(_) => return Ok(()),
            Err(e) => e,
        };

        // The opening brace sits on its own line, so block lines are off by one.
        let wrapped = format!("{{\n{source}\n}}");
        let block_err = match syn::parse_str::<syn::Block>(&wrapped) {
            Ok(_) => return Ok(()),
            Err(e) => e,
        };

        let file_line = file_err.span().start().line;
        let block_line = block_err.span().start().line.saturating_sub(1);

        // Report whichever attempt got further into the snippet.
        if block_line > file_line {
            Err(SyntaxIssue::new(block_err.to_string(), Some(block_line)))
        } else {
            Err(SyntaxIssue::new(file_err.to_string(), Some(file_line)))
        }
    }
}

/// Blank out rustdoc hidden lines (`# use foo;`) markers, keeping the code.
///
/// `#[attr]` and `#![attr]` lines are left alone.
fn strip_hidden_lines(source: &str) -> String {
    source
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if trimmed == "#" {
                ""
            } else if let Some(rest) = trimmed.strip_prefix("# ") {
                rest
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_full_file() {
        let src = "use std::fmt;\n\npub struct Point { x: i32 }\n\nfn main() {}\n";
        assert!(RustChecker.check(src).is_ok());
    }

    #[test]
    fn test_statement_fragment() {
        let src = "let total = items.iter().sum::<u32>();\nprintln!(\"{total}\");";
        assert!(RustChecker.check(src).is_ok());
    }

    #[test]
    fn test_expression_fragment() {
        assert!(RustChecker.check("value.map(|v| v + 1)").is_ok());
    }

    #[test]
    fn test_hidden_lines() {
        let src = "# fn main() {\nlet x = 1;\n# }";
        assert!(RustChecker.check(src).is_ok());
    }

    #[test]
    fn test_attributes_are_not_hidden_lines() {
        let src = "#[derive(Debug)]\nstruct S;";
        assert!(RustChecker.check(src).is_ok());
    }

    #[test]
    fn test_missing_brace() {
        let issue = RustChecker.check("fn main() {\n    let x = 1;\n").unwrap_err();
        assert!(!issue.message.is_empty());
    }

    #[test]
    fn test_bad_token_reports_line() {
        let issue = RustChecker
            .check("fn ok() {}\n\nfn broken() -> {}\n")
            .unwrap_err();
        assert_eq!(issue.line, Some(3));
    }
}
