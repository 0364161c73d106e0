//! Snippet validator.
//!
//! Resolves each snippet's language tag through a [`LanguageRegistry`] and
//! runs the matching syntax-only checker. Every snippet yields at most one
//! finding.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::CheckConfig;
use crate::format::delimited::{DelimitedChecker, LexicalRules};
use crate::format::json::JsonChecker;
use crate::format::rust::RustChecker;
use crate::format::toml::TomlChecker;
use crate::format::yaml::YamlChecker;
use crate::format::{SyntaxChecker, SyntaxIssue};
use crate::model::{Document, Snippet};
use crate::report::{Finding, FindingKind, Location, Severity};

/// Info-string attributes that opt a snippet out of validation.
pub const SKIP_ATTRIBUTES: &[&str] = &["ignore", "no-check", "nocheck", "skip-check"];

/// Tags that are known but never checked: plain output and grammar notation.
const BUILTIN_UNCHECKED: &[&str] = &[
    "text",
    "txt",
    "plain",
    "plaintext",
    "console",
    "output",
    "terminal",
    "log",
    "diff",
    "patch",
    "ebnf",
    "bnf",
    "abnf",
    "regex",
    "grammar",
];

struct LanguageEntry {
    name: &'static str,
    aliases: &'static [&'static str],
    checker: Box<dyn SyntaxChecker>,
}

impl LanguageEntry {
    fn new(
        name: &'static str,
        aliases: &'static [&'static str],
        checker: impl SyntaxChecker + 'static,
    ) -> Self {
        Self {
            name,
            aliases,
            checker: Box::new(checker),
        }
    }

    fn delimited(
        name: &'static str,
        aliases: &'static [&'static str],
        rules: LexicalRules,
    ) -> Self {
        Self::new(name, aliases, DelimitedChecker::new(rules))
    }
}

fn builtin_languages() -> Vec<LanguageEntry> {
    vec![
        LanguageEntry::new("json", &[], JsonChecker),
        LanguageEntry::delimited("jsonc", &["json5"], LexicalRules::JSONC),
        LanguageEntry::new("yaml", &["yml"], YamlChecker),
        LanguageEntry::new("toml", &[], TomlChecker),
        LanguageEntry::new("rust", &["rs"], RustChecker),
        LanguageEntry::delimited("c", &["h"], LexicalRules::C_LIKE),
        LanguageEntry::delimited("cpp", &["c++", "cc", "cxx", "hpp"], LexicalRules::C_LIKE),
        LanguageEntry::delimited("csharp", &["cs", "c#"], LexicalRules::C_LIKE),
        LanguageEntry::delimited("go", &["golang"], LexicalRules::GO),
        LanguageEntry::delimited("java", &[], LexicalRules::JAVA),
        LanguageEntry::delimited(
            "javascript",
            &["js", "jsx", "mjs", "cjs", "node"],
            LexicalRules::JAVASCRIPT,
        ),
        LanguageEntry::delimited("typescript", &["ts", "tsx"], LexicalRules::JAVASCRIPT),
        LanguageEntry::delimited("kotlin", &["kt", "kts"], LexicalRules::KOTLIN),
        LanguageEntry::delimited("scala", &["sc"], LexicalRules::KOTLIN),
        LanguageEntry::delimited("swift", &[], LexicalRules::SWIFT),
        LanguageEntry::delimited("dart", &[], LexicalRules::DART),
        LanguageEntry::delimited("php", &[], LexicalRules::PHP),
        LanguageEntry::delimited("python", &["py", "py3", "python3"], LexicalRules::PYTHON),
        LanguageEntry::delimited("ruby", &["rb"], LexicalRules::RUBY),
    ]
}

/// Result of resolving a language tag.
pub enum LanguageLookup<'a> {
    /// A checker exists for the tag.
    Checked {
        /// Canonical language name.
        language: &'static str,
        /// The checker to run.
        checker: &'a dyn SyntaxChecker,
    },
    /// Known tag that is deliberately not checked.
    Unchecked,
    /// Not a tag this registry knows.
    Unknown,
}

/// A recognized language and every tag that selects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageInfo {
    /// Canonical name.
    pub name: &'static str,
    /// Alternative tags, built-in and configured.
    pub aliases: Vec<String>,
}

/// Maps fence language tags to syntax checkers.
pub struct LanguageRegistry {
    languages: Vec<LanguageEntry>,
    tags: BTreeMap<String, usize>,
    unchecked: BTreeSet<String>,
}

impl LanguageRegistry {
    /// The built-in languages and aliases.
    #[must_use]
    pub fn builtin() -> Self {
        let languages = builtin_languages();
        let mut tags = BTreeMap::new();
        for (idx, entry) in languages.iter().enumerate() {
            tags.insert(entry.name.to_owned(), idx);
            for alias in entry.aliases {
                tags.insert((*alias).to_owned(), idx);
            }
        }
        Self {
            languages,
            tags,
            unchecked: BUILTIN_UNCHECKED.iter().map(|t| (*t).to_owned()).collect(),
        }
    }

    /// The built-in registry extended with configured skips and aliases.
    ///
    /// Skipped languages win over checkers. Aliases pointing at a language
    /// that does not exist are ignored with a warning.
    #[must_use]
    pub fn for_config(config: &CheckConfig) -> Self {
        let mut registry = Self::builtin();
        for tag in &config.skip_languages {
            let tag = tag.to_lowercase();
            // Skipping a language skips every tag that selects it.
            if let Some(&idx) = registry.tags.get(&tag) {
                let related: Vec<String> = registry
                    .tags
                    .iter()
                    .filter(|&(_, &i)| i == idx)
                    .map(|(t, _)| t.clone())
                    .collect();
                registry.unchecked.extend(related);
            }
            registry.unchecked.insert(tag);
        }
        for (alias, target) in &config.language_aliases {
            let alias = alias.to_lowercase();
            let target = target.to_lowercase();
            if registry.unchecked.contains(&target) {
                registry.unchecked.insert(alias);
            } else if let Some(&idx) = registry.tags.get(&target) {
                registry.tags.insert(alias, idx);
            } else {
                warn!(alias = %alias, target = %target, "ignoring alias to unknown language");
            }
        }
        registry
    }

    /// Resolve a fence tag (case-insensitive).
    #[must_use]
    pub fn resolve(&self, tag: &str) -> LanguageLookup<'_> {
        let tag = tag.to_lowercase();
        if self.unchecked.contains(&tag) {
            return LanguageLookup::Unchecked;
        }
        match self.tags.get(&tag).and_then(|&idx| self.languages.get(idx)) {
            Some(entry) => LanguageLookup::Checked {
                language: entry.name,
                checker: entry.checker.as_ref(),
            },
            None => LanguageLookup::Unknown,
        }
    }

    /// Every checked language with its aliases, in registration order.
    #[must_use]
    pub fn languages(&self) -> Vec<LanguageInfo> {
        self.languages
            .iter()
            .enumerate()
            .map(|(idx, entry)| LanguageInfo {
                name: entry.name,
                aliases: self
                    .tags
                    .iter()
                    .filter(|&(tag, &i)| i == idx && tag != entry.name)
                    .map(|(tag, _)| tag.clone())
                    .collect(),
            })
            .collect()
    }

    /// Tags that are recognized but never checked, sorted.
    pub fn unchecked_tags(&self) -> impl Iterator<Item = &str> {
        self.unchecked.iter().map(String::as_str)
    }
}

/// Findings and counters from validating one or more documents.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct ValidationOutcome {
    /// `syntax_error`, `unknown_language` and `budget_exceeded` findings.
    pub findings: Vec<Finding>,
    /// Snippets that went through a syntax checker.
    pub snippets_checked: usize,
}

enum SnippetOutcome {
    /// A checker ran; carries the syntax error, if any.
    Checked(Option<Finding>),
    /// No checker ran; carries the info finding explaining why, if any.
    NotChecked(Option<Finding>),
}

/// Replace placeholder lines (`...`) with blank lines so elided examples
/// still parse. Line numbers are preserved.
fn blank_placeholders(text: &str) -> Cow<'_, str> {
    let is_placeholder = |line: &str| matches!(line.trim(), "..." | "\u{2026}");
    if !text.lines().any(is_placeholder) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.lines()
            .map(|line| if is_placeholder(line) { "" } else { line })
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

fn snippet_location(document: &Document, snippet: &Snippet, offset: Option<usize>) -> Location {
    Location {
        document: document.id.clone(),
        section: document.section_of(snippet).anchor.clone(),
        line: snippet.line + offset.unwrap_or(0),
    }
}

fn syntax_finding(
    document: &Document,
    snippet: &Snippet,
    language: &str,
    issue: &SyntaxIssue,
) -> Finding {
    Finding::new(
        Severity::Error,
        FindingKind::SyntaxError,
        format!("{language} snippet does not parse: {issue}"),
        snippet_location(document, snippet, issue.line),
    )
}

fn check_snippet(
    document: &Document,
    snippet: &Snippet,
    registry: &LanguageRegistry,
    config: &CheckConfig,
) -> SnippetOutcome {
    if SKIP_ATTRIBUTES.iter().any(|a| snippet.has_attribute(a)) {
        return SnippetOutcome::NotChecked(None);
    }

    if snippet.language.is_empty() {
        let finding = config.report_untagged.then(|| {
            Finding::new(
                Severity::Info,
                FindingKind::UnknownLanguage,
                "code block has no language tag; snippet not checked".to_owned(),
                snippet_location(document, snippet, None),
            )
        });
        return SnippetOutcome::NotChecked(finding);
    }

    match registry.resolve(&snippet.language) {
        LanguageLookup::Unchecked => SnippetOutcome::NotChecked(None),
        LanguageLookup::Unknown => SnippetOutcome::NotChecked(Some(Finding::new(
            Severity::Info,
            FindingKind::UnknownLanguage,
            format!(
                "unrecognized language tag `{}`; snippet not checked",
                snippet.language
            ),
            snippet_location(document, snippet, None),
        ))),
        LanguageLookup::Checked { language, checker } => {
            let source = blank_placeholders(&snippet.text);
            let finding = checker
                .check(&source)
                .err()
                .map(|issue| syntax_finding(document, snippet, language, &issue));
            SnippetOutcome::Checked(finding)
        }
    }
}

/// Validate one snippet. Produces at most one finding.
#[must_use]
pub fn validate_snippet(
    document: &Document,
    snippet: &Snippet,
    registry: &LanguageRegistry,
    config: &CheckConfig,
) -> Option<Finding> {
    match check_snippet(document, snippet, registry, config) {
        SnippetOutcome::Checked(finding) | SnippetOutcome::NotChecked(finding) => finding,
    }
}

/// Validate every snippet of a document within the configured time budget.
///
/// Once the budget is used up, the remaining snippets are skipped and a
/// single `budget_exceeded` warning is recorded.
#[must_use]
pub fn validate_document(
    document: &Document,
    registry: &LanguageRegistry,
    config: &CheckConfig,
) -> ValidationOutcome {
    let started = Instant::now();
    let snippets: Vec<&Snippet> = document.snippets().collect();
    let mut outcome = ValidationOutcome::default();

    for (n, snippet) in snippets.iter().enumerate() {
        if started.elapsed() >= config.document_budget {
            let skipped = snippets.len() - n;
            warn!(document = %document.id, skipped, "snippet validation budget exhausted");
            outcome.findings.push(Finding::new(
                Severity::Warning,
                FindingKind::BudgetExceeded,
                format!(
                    "validation budget of {} ms exhausted; {skipped} snippet(s) not checked",
                    config.document_budget.as_millis()
                ),
                snippet_location(document, snippet, None),
            ));
            break;
        }

        match check_snippet(document, snippet, registry, config) {
            SnippetOutcome::Checked(finding) => {
                outcome.snippets_checked += 1;
                outcome.findings.extend(finding);
            }
            SnippetOutcome::NotChecked(finding) => outcome.findings.extend(finding),
        }
    }

    debug!(
        document = %document.id,
        snippets = snippets.len(),
        checked = outcome.snippets_checked,
        findings = outcome.findings.len(),
        "validated snippets"
    );
    outcome
}

/// Validate all documents. Documents are independent, so they are checked
/// in parallel; results keep document order.
#[must_use]
pub fn validate_documents(
    documents: &[Document],
    registry: &LanguageRegistry,
    config: &CheckConfig,
) -> ValidationOutcome {
    documents
        .par_iter()
        .map(|doc| validate_document(doc, registry, config))
        .collect::<Vec<_>>()
        .into_iter()
        .fold(ValidationOutcome::default(), |mut acc, outcome| {
            acc.snippets_checked += outcome.snippets_checked;
            acc.findings.extend(outcome.findings);
            acc
        })
}
