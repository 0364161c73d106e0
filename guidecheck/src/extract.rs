//! Markdown extractor.
//!
//! Walks a document line by line with a small state machine: headings open
//! sections, fenced code blocks become snippets, HTML comment blocks are
//! dropped, everything else is prose.
//! Fences follow CommonMark: ``` or ~~~ runs of at least three, closed by the
//! same character with at least the same length and no info string.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;
use crate::model::{AnchorSet, Block, Document, Section, Snippet, slugify};

/// `## Title {#custom-id}`
static EXPLICIT_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r"\s*\{#([^\s{}]+)\}\s*$") {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid explicit id regex: {err}"),
    }
});

/// `## <a name="custom-id"></a> Title`
static HTML_ANCHOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r#"<a\s+(?:name|id)\s*=\s*"([^"]+)"\s*>\s*(?:</a>)?"#) {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid html anchor regex: {err}"),
    }
});

/// Lines that cannot be the text of a setext heading.
static BLOCK_START_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r"^\s*(?:[-*+]\s|\d+[.)]\s|>|<|\|)") {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid block start regex: {err}"),
    }
});

#[derive(Debug)]
enum MarkdownState<'a> {
    Prose,
    FencedBlock(OpenFence<'a>),
    /// Inside a multi-line `<!-- ... -->` block; nothing here is content.
    HtmlComment,
}

#[derive(Debug)]
struct OpenFence<'a> {
    fence_char: char,
    opening_fence_len: usize,
    indent: usize,
    info: &'a str,
    line: usize,
    body: Vec<&'a str>,
}

impl OpenFence<'_> {
    fn closes_on(&self, line: &str) -> bool {
        parse_fence(line).is_some_and(|fence| {
            fence.fence_char == self.fence_char
                && fence.len >= self.opening_fence_len
                && fence.info.is_empty()
        })
    }

    fn marker(&self) -> String {
        std::iter::repeat_n(self.fence_char, self.opening_fence_len).collect()
    }
}

struct Fence<'a> {
    fence_char: char,
    len: usize,
    indent: usize,
    info: &'a str,
}

fn parse_fence(line: &str) -> Option<Fence<'_>> {
    let trimmed = line.trim_start_matches([' ', '\t']);
    let indent = line.len() - trimmed.len();
    let fence_char = match trimmed.as_bytes().first() {
        Some(b'`') => '`',
        Some(b'~') => '~',
        _ => return None,
    };

    let len = trimmed.chars().take_while(|&c| c == fence_char).count();
    if len < 3 {
        return None;
    }
    let info = trimmed[len..].trim();
    // A backtick fence whose info string holds a backtick is inline code.
    if fence_char == '`' && info.contains('`') {
        return None;
    }
    Some(Fence {
        fence_char,
        len,
        indent,
        info,
    })
}

/// Parse an ATX heading into `(level, text)`.
fn parse_atx_heading(line: &str) -> Option<(u8, &str)> {
    let rest = line.trim_start_matches(' ');
    if line.len() - rest.len() > 3 {
        return None;
    }
    let hashes = rest.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let after = &rest[hashes..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }

    let text = after.trim();
    let without_closing = text.trim_end_matches('#');
    let text = if without_closing.is_empty() {
        ""
    } else if without_closing.ends_with([' ', '\t']) {
        without_closing.trim_end()
    } else {
        text
    };
    Some((u8::try_from(hashes).ok()?, text))
}

/// Setext underline level: `===` is 1, `---` is 2.
fn setext_level(line: &str) -> Option<u8> {
    let rest = line.trim_start_matches(' ');
    if line.len() - rest.len() > 3 {
        return None;
    }
    let underline = rest.trim_end();
    if !underline.is_empty() && underline.bytes().all(|b| b == b'=') {
        Some(1)
    } else if !underline.is_empty() && underline.bytes().all(|b| b == b'-') {
        Some(2)
    } else {
        None
    }
}

/// Index of the closing line of a leading YAML front-matter block.
fn front_matter_end(lines: &[&str]) -> Option<usize> {
    if lines.first().map(|l| l.trim_end()) != Some("---") {
        return None;
    }
    lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, l)| matches!(l.trim_end(), "---" | "..."))
        .map(|(idx, _)| idx)
}

/// Whether `line` opens an HTML comment block: `<!--` after at most three
/// spaces. Returns whether the comment also ends on this line.
fn html_comment_start(line: &str) -> Option<bool> {
    let rest = line.trim_start_matches(' ');
    if line.len() - rest.len() > 3 {
        return None;
    }
    rest.strip_prefix("<!--").map(|body| body.contains("-->"))
}

/// Remove up to `indent` leading spaces/tabs.
fn strip_indent(line: &str, indent: usize) -> &str {
    let leading = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[leading.min(indent)..]
}

/// Split a heading into its display title and an explicit anchor, if any.
fn split_explicit_id(text: &str) -> (String, Option<String>) {
    if let Some(caps) = EXPLICIT_ID_PATTERN.captures(text)
        && let (Some(all), Some(id)) = (caps.get(0), caps.get(1))
    {
        return (
            text[..all.start()].trim().to_owned(),
            Some(id.as_str().to_lowercase()),
        );
    }
    if let Some(caps) = HTML_ANCHOR_PATTERN.captures(text)
        && let Some(id) = caps.get(1)
    {
        let id = id.as_str().to_lowercase();
        let title = HTML_ANCHOR_PATTERN.replace(text, "").trim().to_owned();
        return (title, Some(id));
    }
    (text.trim().to_owned(), None)
}

struct DocumentBuilder<'a> {
    document: Document,
    anchors: AnchorSet,
    prose: Vec<&'a str>,
    prose_line: usize,
    paragraph_len: usize,
}

impl<'a> DocumentBuilder<'a> {
    fn new(id: &str) -> Self {
        Self {
            document: Document::new(id),
            anchors: AnchorSet::new(),
            prose: Vec::new(),
            prose_line: 0,
            paragraph_len: 0,
        }
    }

    fn current_blocks(&mut self) -> &mut Vec<Block> {
        let last = self.document.sections.len() - 1;
        &mut self.document.sections[last].blocks
    }

    fn flush_prose(&mut self) {
        while self.prose.last().is_some_and(|l| l.trim().is_empty()) {
            self.prose.pop();
        }
        if self.prose.is_empty() {
            return;
        }
        let text = self.prose.join("\n");
        let line = self.prose_line;
        self.prose.clear();
        self.current_blocks().push(Block::Prose { text, line });
    }

    fn open_section(&mut self, heading: &str, depth: u8, line: usize) {
        self.flush_prose();
        self.paragraph_len = 0;
        let (title, explicit) = split_explicit_id(heading);
        let base = explicit.unwrap_or_else(|| slugify(&title));
        let anchor = self.anchors.claim(&base);
        self.document
            .sections
            .push(Section::new(title, base, anchor, depth, line));
    }

    fn push_snippet(&mut self, fence: &OpenFence<'_>) {
        let (language, attributes) = Snippet::parse_info(fence.info);
        let section = self.document.sections.len() - 1;
        let snippet = Snippet {
            language,
            attributes,
            text: fence.body.join("\n"),
            line: fence.line,
            section,
        };
        self.current_blocks().push(Block::Snippet(snippet));
    }

    /// Handle one line outside a fence and return the next state.
    fn prose_line(&mut self, line_number: usize, line: &'a str) -> MarkdownState<'a> {
        if let Some(closed) = html_comment_start(line) {
            self.flush_prose();
            self.paragraph_len = 0;
            return if closed {
                MarkdownState::Prose
            } else {
                MarkdownState::HtmlComment
            };
        }

        if let Some(fence) = parse_fence(line) {
            self.flush_prose();
            self.paragraph_len = 0;
            return MarkdownState::FencedBlock(OpenFence {
                fence_char: fence.fence_char,
                opening_fence_len: fence.len,
                indent: fence.indent,
                info: fence.info,
                line: line_number,
                body: Vec::new(),
            });
        }

        if let Some((depth, text)) = parse_atx_heading(line) {
            self.open_section(text, depth, line_number);
            return MarkdownState::Prose;
        }

        if self.paragraph_len == 1
            && let Some(depth) = setext_level(line)
            && let Some(&title) = self.prose.last()
            && !BLOCK_START_PATTERN.is_match(title)
        {
            self.prose.pop();
            self.open_section(title, depth, line_number - 1);
            return MarkdownState::Prose;
        }

        if line.trim().is_empty() {
            self.paragraph_len = 0;
            if !self.prose.is_empty() {
                self.prose.push(line);
            }
        } else {
            self.paragraph_len += 1;
            if self.prose.is_empty() {
                self.prose_line = line_number;
            }
            self.prose.push(line);
        }
        MarkdownState::Prose
    }

    fn finish(mut self) -> Document {
        self.flush_prose();
        self.document
    }
}

/// Parse raw Markdown into a [`Document`].
///
/// # Errors
///
/// Returns [`ParseError::UnterminatedFence`] when the input ends inside a
/// fenced code block.
pub fn extract_document(id: &str, content: &str) -> Result<Document, ParseError> {
    let lines: Vec<&str> = content.lines().collect();
    let start = front_matter_end(&lines).map_or(0, |end| end + 1);

    let mut builder = DocumentBuilder::new(id);
    let mut state = MarkdownState::Prose;

    for (idx, &line) in lines.iter().enumerate().skip(start) {
        let line_number = idx + 1; // 1-indexed
        state = match state {
            MarkdownState::Prose => builder.prose_line(line_number, line),
            MarkdownState::FencedBlock(mut fence) => {
                if fence.closes_on(line) {
                    builder.push_snippet(&fence);
                    MarkdownState::Prose
                } else {
                    fence.body.push(strip_indent(line, fence.indent));
                    MarkdownState::FencedBlock(fence)
                }
            }
            MarkdownState::HtmlComment if line.contains("-->") => MarkdownState::Prose,
            MarkdownState::HtmlComment => MarkdownState::HtmlComment,
        };
    }

    if let MarkdownState::FencedBlock(fence) = state {
        return Err(ParseError::UnterminatedFence {
            line: fence.line,
            fence: fence.marker(),
        });
    }

    Ok(builder.finish())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn snippets(doc: &Document) -> Vec<&Snippet> {
        doc.snippets().collect()
    }

    #[test]
    fn test_extract_sections_and_snippets() {
        let content = "\
Intro text.

# Style Guide

## Naming

Use short names.

```go
func f() {}
```

## Errors

~~~python
raise ValueError()
~~~
";
        let doc = extract_document("guide.md", content).unwrap();
        let anchors: Vec<&str> = doc.sections.iter().map(|s| s.anchor.as_str()).collect();
        assert_eq!(anchors, vec!["", "style-guide", "naming", "errors"]);
        assert_eq!(doc.sections[1].depth, 1);
        assert_eq!(doc.sections[2].depth, 2);
        assert_eq!(doc.sections[2].line, 5);

        let snips = snippets(&doc);
        assert_eq!(snips.len(), 2);
        assert_eq!(snips[0].language, "go");
        assert_eq!(snips[0].text, "func f() {}");
        assert_eq!(snips[0].line, 9);
        assert_eq!(doc.section_of(snips[0]).anchor, "naming");
        assert_eq!(snips[1].language, "python");
        assert_eq!(doc.section_of(snips[1]).anchor, "errors");

        // Prose before the first heading lands in the preamble.
        assert!(matches!(
            doc.preamble().blocks.first(),
            Some(Block::Prose { line: 1, .. })
        ));
    }

    #[test]
    fn test_unterminated_fence_is_parse_error() {
        let content = "# Title\n\n```rust\nfn main() {}\n";
        let err = extract_document("a.md", content).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnterminatedFence {
                line: 3,
                fence: "```".to_owned()
            }
        );
    }

    #[test]
    fn test_headings_inside_fence_are_ignored() {
        let content = "# Real\n\n```bash\n# not a heading\n```\n";
        let doc = extract_document("a.md", content).unwrap();
        assert_eq!(doc.headed_sections().count(), 1);
        assert_eq!(snippets(&doc)[0].text, "# not a heading");
    }

    #[test]
    fn test_mismatched_fence_does_not_close_block() {
        let content = "```text\n~~~\n# inside\n```\n";
        let doc = extract_document("a.md", content).unwrap();
        assert_eq!(doc.headed_sections().count(), 0);
        assert_eq!(snippets(&doc)[0].text, "~~~\n# inside");
    }

    #[test]
    fn test_shorter_fence_does_not_close_longer_one() {
        let content = "````markdown\n```go\nx\n```\n````\n";
        let doc = extract_document("a.md", content).unwrap();
        let snips = snippets(&doc);
        assert_eq!(snips.len(), 1);
        assert_eq!(snips[0].language, "markdown");
        assert_eq!(snips[0].text, "```go\nx\n```");
    }

    #[test]
    fn test_fence_with_info_string_does_not_close() {
        // The second fence carries an info string, so it is content.
        let content = "```\n```js\n```\n";
        let doc = extract_document("a.md", content).unwrap();
        let snips = snippets(&doc);
        assert_eq!(snips.len(), 1);
        assert!(snips[0].language.is_empty());
        assert_eq!(snips[0].text, "```js");
    }

    #[test]
    fn test_indented_fence_strips_indentation() {
        let content = "- item\n\n  ```js\n  if (x) {\n    y();\n  }\n  ```\n";
        let doc = extract_document("a.md", content).unwrap();
        assert_eq!(snippets(&doc)[0].text, "if (x) {\n  y();\n}");
    }

    #[test]
    fn test_inline_triple_backticks_are_not_a_fence() {
        let content = "```inline``` code\n# Heading\n";
        let doc = extract_document("a.md", content).unwrap();
        assert_eq!(doc.headed_sections().count(), 1);
        assert_eq!(doc.snippets().count(), 0);
    }

    #[test]
    fn test_setext_headings() {
        let content = "Title\n=====\n\nText\n\nSub Part\n--------\n\n---\n";
        let doc = extract_document("a.md", content).unwrap();
        let heads: Vec<(&str, u8, usize)> = doc
            .headed_sections()
            .map(|s| (s.title.as_str(), s.depth, s.line))
            .collect();
        assert_eq!(heads, vec![("Title", 1, 1), ("Sub Part", 2, 6)]);
    }

    #[test]
    fn test_list_item_before_dashes_is_not_setext() {
        let content = "- item\n---\n";
        let doc = extract_document("a.md", content).unwrap();
        assert_eq!(doc.headed_sections().count(), 0);
    }

    #[test]
    fn test_atx_heading_variants() {
        assert_eq!(parse_atx_heading("# Title"), Some((1, "Title")));
        assert_eq!(parse_atx_heading("### Title ###"), Some((3, "Title")));
        assert_eq!(parse_atx_heading("## C#"), Some((2, "C#")));
        assert_eq!(parse_atx_heading("#"), Some((1, "")));
        assert_eq!(parse_atx_heading("#hashtag"), None);
        assert_eq!(parse_atx_heading("####### seven"), None);
        assert_eq!(parse_atx_heading("    # code"), None);
    }

    #[test]
    fn test_explicit_ids() {
        let content = "## Nombres {#naming}\n\n## <a name=\"errors\"></a> Errores\n";
        let doc = extract_document("es.md", content).unwrap();
        let heads: Vec<(&str, &str)> = doc
            .headed_sections()
            .map(|s| (s.title.as_str(), s.anchor.as_str()))
            .collect();
        assert_eq!(heads, vec![("Nombres", "naming"), ("Errores", "errors")]);
    }

    #[test]
    fn test_duplicate_headings_get_unique_anchors() {
        let content = "## Example\n\n## Example\n\n## Example\n";
        let doc = extract_document("a.md", content).unwrap();
        let anchors: Vec<&str> = doc.headed_sections().map(|s| s.anchor.as_str()).collect();
        assert_eq!(anchors, vec!["example", "example-1", "example-2"]);
        let slugs: Vec<&str> = doc.headed_sections().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs, vec!["example"; 3]);
    }

    #[test]
    fn test_html_comment_hides_headings_and_fences() {
        let content = "\
# Guide

<!--
## Old section

```go
func (
```
-->

<!-- one-line comment -->
## Kept
";
        let doc = extract_document("a.md", content).unwrap();
        let heads: Vec<(&str, usize)> = doc
            .headed_sections()
            .map(|s| (s.title.as_str(), s.line))
            .collect();
        assert_eq!(heads, vec![("Guide", 1), ("Kept", 12)]);
        assert!(snippets(&doc).is_empty());
        assert!(doc.sections[1].blocks.is_empty());
    }

    #[test]
    fn test_unclosed_html_comment_runs_to_the_end() {
        let content = "# Guide\n\n<!-- draft\n## Hidden\n";
        let doc = extract_document("a.md", content).unwrap();
        assert_eq!(doc.headed_sections().count(), 1);
    }

    #[test]
    fn test_front_matter_is_skipped() {
        let content = "---\ntitle: Guide\n# not: heading\n---\n# Real\n";
        let doc = extract_document("a.md", content).unwrap();
        let heads: Vec<(&str, usize)> = doc
            .headed_sections()
            .map(|s| (s.title.as_str(), s.line))
            .collect();
        assert_eq!(heads, vec![("Real", 5)]);
        assert!(doc.preamble().blocks.is_empty());
    }

    #[test]
    fn test_info_attributes() {
        let content = "```rust,ignore\nfn\n```\n";
        let doc = extract_document("a.md", content).unwrap();
        let snip = snippets(&doc)[0];
        assert_eq!(snip.language, "rust");
        assert!(snip.has_attribute("ignore"));
    }

    #[test]
    fn test_empty_document() {
        let doc = extract_document("empty.md", "").unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.variant, "empty");
    }
}
