#![allow(clippy::unwrap_used)]
//! End-to-end tests for the `check`, `outline` and `languages` commands.
//!
//! Commands are parsed with `Cli::try_parse_from` and run through `execute`
//! with an in-memory writer, so no process is spawned.

use std::fs;
use std::path::Path;

use clap::Parser;
use guidecheck_cli::cli::{Cli, execute};
use tempfile::TempDir;

const EN: &str = "\
# Guide

## Setup

```yaml
name: demo
ports: [80, 443]
```

## Usage

```go
func main() {
    fmt.Println(\"hi\")
}
```
";

fn run(args: &[&str]) -> (anyhow::Result<i32>, String) {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut buf = Vec::new();
    let result = execute(&cli, &mut buf, false);
    (result, String::from_utf8(buf).unwrap())
}

fn corpus(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(tmp.path().join(name), content).unwrap();
    }
    tmp
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_check_clean_corpus_exits_zero() {
    let tmp = corpus(&[("en.md", EN), ("de.md", EN)]);
    let root = path_arg(tmp.path());
    let (result, out) = run(&["guidecheck", "check", &root]);
    assert_eq!(result.unwrap(), 0);
    assert!(out.contains("GUIDE CONSISTENCY REPORT"));
    assert!(out.contains("2 document(s) consistent"));
}

#[test]
fn test_check_syntax_error_exits_one() {
    let broken = EN.replace("ports: [80, 443]", "ports: [80, 443");
    let tmp = corpus(&[("en.md", &broken)]);
    let root = path_arg(tmp.path());
    let (result, out) = run(&["guidecheck", "check", &root, "--format", "json"]);
    assert_eq!(result.unwrap(), 1);

    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["ok"], false);
    assert_eq!(value["findings"][0]["kind"], "syntax_error");
    assert_eq!(value["findings"][0]["location"]["section"], "setup");
}

#[test]
fn test_check_strict_turns_drift_into_failure() {
    let extra = format!("{EN}\n## Extra\n\nOnly here.\n");
    let tmp = corpus(&[("a.md", EN), ("b.md", &extra)]);
    let root = path_arg(tmp.path());

    let (result, _) = run(&["guidecheck", "check", &root]);
    assert_eq!(result.unwrap(), 0);

    let (result, out) = run(&["guidecheck", "check", &root, "--strict"]);
    assert_eq!(result.unwrap(), 1);
    assert!(out.contains("extra"), "got: {out}");
}

#[test]
fn test_check_no_align_and_skip_language() {
    let broken = EN.replace("fmt.Println(\"hi\")", "fmt.Println(\"hi\"");
    let tmp = corpus(&[("a.md", &broken), ("b.md", "# Guide\n")]);
    let root = path_arg(tmp.path());

    let (result, _) = run(&["guidecheck", "check", &root]);
    assert_eq!(result.unwrap(), 1);

    let (result, out) = run(&[
        "guidecheck",
        "check",
        &root,
        "--no-align",
        "--skip-language",
        "go",
        "--format",
        "json",
    ]);
    assert_eq!(result.unwrap(), 0);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["counts"]["warnings"], 0);
    assert_eq!(value["snippets_checked"], 1);
}

#[test]
fn test_check_config_file() {
    let extra = format!("{EN}\n## Extra\n\nOnly here.\n");
    let tmp = corpus(&[("a.md", EN), ("b.md", &extra)]);
    let config = tmp.path().join("guidecheck.toml");
    fs::write(&config, "drift_severity = \"error\"\nreference = \"b\"\n").unwrap();
    let root = path_arg(tmp.path());
    let config = path_arg(&config);

    let (result, out) = run(&[
        "guidecheck", "check", &root, "--config", &config, "--format", "json",
    ]);
    assert_eq!(result.unwrap(), 1);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["findings"][0]["drift"], "missing_in_variant");
    assert_eq!(value["findings"][0]["location"]["document"], "a.md");
}

#[test]
fn test_color_choice_controls_escapes() {
    let broken = EN.replace("ports: [80, 443]", "ports: [80, 443");
    let tmp = corpus(&[("en.md", &broken)]);
    let root = path_arg(tmp.path());

    let (result, out) = run(&["guidecheck", "check", &root, "--color", "always"]);
    assert_eq!(result.unwrap(), 1);
    assert!(out.contains("\x1b["), "got: {out}");
    assert!(out.contains("syntax_error"));

    let (result, out) = run(&["guidecheck", "check", &root, "--color", "never"]);
    assert_eq!(result.unwrap(), 1);
    assert!(!out.contains('\x1b'), "got: {out}");
}

#[test]
fn test_check_missing_path_is_error() {
    let tmp = TempDir::new().unwrap();
    let missing = path_arg(&tmp.path().join("nope"));
    let (result, _) = run(&["guidecheck", "check", &missing]);
    assert!(result.unwrap_err().to_string().contains("does not exist"));
}

#[test]
fn test_check_bad_config_is_error() {
    let tmp = corpus(&[("en.md", EN)]);
    let config = tmp.path().join("bad.toml");
    fs::write(&config, "fuzzy_threshold = \"four\"\n").unwrap();
    let root = path_arg(tmp.path());
    let config = path_arg(&config);
    let (result, _) = run(&["guidecheck", "check", &root, "--config", &config]);
    assert!(result.is_err());
}

#[test]
fn test_outline_human_and_json() {
    let tmp = corpus(&[("en.md", EN)]);
    let file = path_arg(&tmp.path().join("en.md"));

    let (result, out) = run(&["guidecheck", "outline", &file]);
    assert_eq!(result.unwrap(), 0);
    assert!(out.contains("Setup #setup L3 [yaml]"), "got: {out}");
    assert!(out.contains("Usage #usage L10 [go]"), "got: {out}");

    let (result, out) = run(&["guidecheck", "outline", &file, "--format", "json"]);
    assert_eq!(result.unwrap(), 0);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["id"], "en.md");
    assert_eq!(value["sections"][2]["anchor"], "setup");
}

#[test]
fn test_outline_unterminated_fence_is_error() {
    let tmp = corpus(&[("en.md", "# Guide\n\n```rust\nfn main() {}\n")]);
    let file = path_arg(&tmp.path().join("en.md"));
    let (result, _) = run(&["guidecheck", "outline", &file]);
    assert!(result.is_err());
}

#[test]
fn test_languages_lists_aliases() {
    let (result, out) = run(&["guidecheck", "languages"]);
    assert_eq!(result.unwrap(), 0);
    assert!(out.lines().any(|l| l.starts_with("yaml (") && l.contains("yml")));
    assert!(out.contains("not checked: "));
    assert!(out.contains("text"));
}
