//! Parsed guide structure: documents, sections, blocks and snippets.
//!
//! A [`Document`] always starts with a depth-0 preamble section that holds
//! whatever precedes the first heading, so every block has exactly one
//! enclosing section.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Anchor of the synthetic preamble section.
pub const PREAMBLE_ANCHOR: &str = "";

static EMPTY_PREAMBLE: Section = Section::preamble();

/// One guide variant, parsed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct Document {
    /// Identifier, usually the path relative to the scan root with `/` separators.
    pub id: String,
    /// Variant name (the file stem of `id`).
    pub variant: String,
    /// Sections in document order. Index 0 is always the preamble.
    pub sections: Vec<Section>,
}

impl Document {
    /// Create a document holding only an empty preamble section.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            variant: variant_name(id),
            sections: vec![Section::preamble()],
        }
    }

    /// The depth-0 section holding content before the first heading.
    ///
    /// Falls back to an empty preamble when `sections` was emptied by hand.
    #[must_use]
    pub fn preamble(&self) -> &Section {
        self.sections.first().unwrap_or(&EMPTY_PREAMBLE)
    }

    /// Sections introduced by a real heading (everything except the preamble).
    pub fn headed_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.depth > 0)
    }

    /// All snippets in document order.
    pub fn snippets(&self) -> impl Iterator<Item = &Snippet> {
        self.sections
            .iter()
            .flat_map(|s| s.blocks.iter())
            .filter_map(|b| match b {
                Block::Snippet(snippet) => Some(snippet),
                Block::Prose { .. } => None,
            })
    }

    /// The section a snippet belongs to.
    #[must_use]
    pub fn section_of(&self, snippet: &Snippet) -> &Section {
        self.sections
            .get(snippet.section)
            .unwrap_or_else(|| self.preamble())
    }
}

/// Derive the variant name from a document id: the last path component
/// without its extension.
fn variant_name(id: &str) -> String {
    let file = id.rsplit(['/', '\\']).next().unwrap_or(id);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_owned(),
        _ => file.to_owned(),
    }
}

/// A heading together with the blocks that follow it up to the next heading.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct Section {
    /// Heading text with the `#` markers and explicit id attribute removed.
    pub title: String,
    /// Unique (per document) anchor slug.
    pub anchor: String,
    /// Anchor before deduplication: the second `Example` heading has anchor
    /// `example-1` and slug `example`.
    pub slug: String,
    /// Heading level, 1..=6; 0 for the preamble.
    pub depth: u8,
    /// 1-indexed line of the heading (1 for the preamble).
    pub line: usize,
    /// Content blocks in order.
    pub blocks: Vec<Block>,
}

impl Section {
    /// Title, anchor and slug are all empty ([`PREAMBLE_ANCHOR`]).
    const fn preamble() -> Self {
        Self {
            title: String::new(),
            anchor: String::new(),
            slug: String::new(),
            depth: 0,
            line: 1,
            blocks: Vec::new(),
        }
    }

    pub(crate) fn new(title: String, slug: String, anchor: String, depth: u8, line: usize) -> Self {
        Self {
            title,
            anchor,
            slug,
            depth,
            line,
            blocks: Vec::new(),
        }
    }
}

/// Content inside a section.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A run of non-code lines.
    Prose {
        /// The raw lines, joined with `\n`.
        text: String,
        /// 1-indexed line of the first prose line.
        line: usize,
    },
    /// A fenced code block.
    Snippet(Snippet),
}

/// A fenced code example.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct Snippet {
    /// Lowercased first word of the info string; empty when the fence has none.
    pub language: String,
    /// Remaining info-string words (`ignore`, `{.bad}`, ...).
    pub attributes: Vec<String>,
    /// Code between the fences, with the fence indentation removed.
    pub text: String,
    /// 1-indexed line of the opening fence.
    pub line: usize,
    /// Index of the enclosing section in [`Document::sections`].
    pub section: usize,
}

impl Snippet {
    /// Whether the info string carries `name` as an attribute (case-insensitive).
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Split a fence info string into a language tag and attributes.
    ///
    /// Accepts both `rust,ignore` and `go {.bad}` conventions.
    #[must_use]
    pub fn parse_info(info: &str) -> (String, Vec<String>) {
        let mut words = info
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(|w| w.trim_matches(|c| c == '{' || c == '}'))
            .filter(|w| !w.is_empty());
        let language = words.next().unwrap_or_default().to_lowercase();
        (language, words.map(str::to_owned).collect())
    }
}

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r"!?\[([^\]]*)\]\([^)]*\)") {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid link regex: {err}"),
    }
});

static HTML_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r"<[^>]+>") {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid tag regex: {err}"),
    }
});

/// Turn heading text into an anchor slug.
///
/// Lowercases, drops inline markup and punctuation (keeping `-` and `_`),
/// and joins words with single hyphens. Non-ASCII letters survive so that
/// translated headings still get meaningful anchors.
#[must_use]
pub fn slugify(title: &str) -> String {
    let without_links = LINK_PATTERN.replace_all(title, "$1");
    let without_tags = HTML_TAG_PATTERN.replace_all(&without_links, "");

    let mut slug = String::with_capacity(without_tags.len());
    let mut pending_hyphen = false;
    for c in without_tags.chars() {
        if c.is_whitespace() {
            pending_hyphen = !slug.is_empty();
        } else if c.is_alphanumeric() || c == '-' || c == '_' {
            if pending_hyphen {
                slug.push('-');
                pending_hyphen = false;
            }
            slug.extend(c.to_lowercase());
        }
    }
    slug
}

/// Hands out unique anchors within one document, GitHub style:
/// the second `usage` becomes `usage-1`, the third `usage-2`.
#[derive(Debug)]
pub(crate) struct AnchorSet {
    taken: HashSet<String>,
}

impl AnchorSet {
    pub(crate) fn new() -> Self {
        let mut taken = HashSet::new();
        taken.insert(PREAMBLE_ANCHOR.to_owned());
        Self { taken }
    }

    pub(crate) fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_owned()) {
            return base.to_owned();
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{base}-{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Error Handling"), "error-handling");
        assert_eq!(slugify("  Naming   Conventions "), "naming-conventions");
    }

    #[test]
    fn test_slugify_is_case_insensitive() {
        assert_eq!(slugify("Testing"), slugify("testing"));
    }

    #[test]
    fn test_slugify_strips_markup_and_punctuation() {
        assert_eq!(slugify("Use `defer` to *clean up*!"), "use-defer-to-clean-up");
        assert_eq!(slugify("See [the docs](https://example.com)"), "see-the-docs");
        assert_eq!(slugify("Pointers vs. Values?"), "pointers-vs-values");
        assert_eq!(slugify("snake_case names"), "snake_case-names");
    }

    #[test]
    fn test_slugify_keeps_non_ascii_letters() {
        assert_eq!(slugify("Gu\u{ed}a de estilo"), "gu\u{ed}a-de-estilo");
        assert_eq!(slugify("\u{547d}\u{540d}"), "\u{547d}\u{540d}");
    }

    #[test]
    fn test_anchor_set_suffixes_duplicates() {
        let mut anchors = AnchorSet::new();
        assert_eq!(anchors.claim("example"), "example");
        assert_eq!(anchors.claim("example"), "example-1");
        assert_eq!(anchors.claim("example"), "example-2");
        // Empty slugs never collide with the preamble.
        assert_eq!(anchors.claim(""), "-1");
    }

    #[test]
    fn test_anchor_set_skips_taken_suffix() {
        let mut anchors = AnchorSet::new();
        assert_eq!(anchors.claim("a-1"), "a-1");
        assert_eq!(anchors.claim("a"), "a");
        assert_eq!(anchors.claim("a"), "a-2");
    }

    #[test]
    fn test_parse_info() {
        let (lang, attrs) = Snippet::parse_info("Rust,ignore");
        assert_eq!(lang, "rust");
        assert_eq!(attrs, vec!["ignore".to_owned()]);

        let (lang, attrs) = Snippet::parse_info("go {.bad}");
        assert_eq!(lang, "go");
        assert_eq!(attrs, vec![".bad".to_owned()]);

        let (lang, attrs) = Snippet::parse_info("");
        assert!(lang.is_empty());
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_preamble_survives_cleared_sections() {
        let mut doc = Document::new("a.md");
        doc.sections.clear();
        let preamble = doc.preamble();
        assert_eq!(preamble.depth, 0);
        assert_eq!(preamble.anchor, PREAMBLE_ANCHOR);
        assert!(preamble.blocks.is_empty());
    }

    #[test]
    fn test_variant_name() {
        assert_eq!(variant_name("guide/README.zh-CN.md"), "README.zh-CN");
        assert_eq!(variant_name("style.md"), "style");
        assert_eq!(variant_name("NOTES"), "NOTES");
    }
}
