//! Lexical balance check for brace languages and scripting languages.
//!
//! This is a lexical approximation, not a grammar. Most broken guide examples
//! are broken at the lexical level: a bracket left open, a string that never
//! ends, a comment that swallows the rest of the snippet. The checker
//! tokenizes just enough (comments, string literals, JavaScript regular
//! expressions) to find those without being fooled by brackets inside
//! literals. For Go it also flags an operator with no operand after it,
//! such as `x := := 1` or `y = }`.
//!
//! Scanning is byte-based. All delimiters are ASCII and UTF-8 continuation
//! bytes never collide with ASCII, so multi-byte text is skipped safely.

use super::{SyntaxChecker, SyntaxIssue};

/// Comment and string syntax of one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexicalRules {
    /// Line comment introducers.
    pub line_comments: &'static [&'static str],
    /// Block comment open/close pair.
    pub block_comment: Option<(&'static str, &'static str)>,
    /// Whether block comments nest.
    pub nested_block_comments: bool,
    /// Single-line quote characters with backslash escapes.
    pub quotes: &'static [u8],
    /// Multi-line quote sequences with backslash escapes (`"""`, `'''`).
    pub triple_quotes: &'static [&'static str],
    /// A quote character whose strings may span lines (backtick).
    pub multiline_quote: Option<u8>,
    /// Whether backslash escapes apply inside `multiline_quote` strings.
    pub multiline_escapes: bool,
    /// Language-specific lexing on top of the table.
    pub dialect: Dialect,
}

/// Extra lexing a few languages need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Comments, strings and brackets only.
    Plain,
    /// `/.../flags` can be a regular expression literal.
    JavaScript,
    /// Operators missing an operand (`x := := 1`) are errors.
    Go,
}

impl LexicalRules {
    /// C, C++, C#, and anything else with `//`, `/* */`, `"` and `'`.
    pub const C_LIKE: Self = Self {
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        nested_block_comments: false,
        quotes: b"\"'",
        triple_quotes: &[],
        multiline_quote: None,
        multiline_escapes: true,
        dialect: Dialect::Plain,
    };

    /// Java: C-like plus `"""` text blocks.
    pub const JAVA: Self = Self {
        triple_quotes: &["\"\"\""],
        ..Self::C_LIKE
    };

    /// Go: raw strings in backticks, no escapes inside them, and operator
    /// adjacency checks.
    pub const GO: Self = Self {
        multiline_quote: Some(b'`'),
        multiline_escapes: false,
        dialect: Dialect::Go,
        ..Self::C_LIKE
    };

    /// JavaScript and TypeScript: template literals in backticks and regular
    /// expression literals.
    pub const JAVASCRIPT: Self = Self {
        multiline_quote: Some(b'`'),
        multiline_escapes: true,
        dialect: Dialect::JavaScript,
        ..Self::C_LIKE
    };

    /// Kotlin and Scala: nesting block comments and `"""` raw strings.
    pub const KOTLIN: Self = Self {
        nested_block_comments: true,
        triple_quotes: &["\"\"\""],
        ..Self::C_LIKE
    };

    /// Swift: like Kotlin, but `'` is not a quote.
    pub const SWIFT: Self = Self {
        quotes: b"\"",
        ..Self::KOTLIN
    };

    /// Dart: nesting comments, both triple-quote styles.
    pub const DART: Self = Self {
        nested_block_comments: true,
        triple_quotes: &["\"\"\"", "'''"],
        ..Self::C_LIKE
    };

    /// PHP: `#` is also a line comment.
    pub const PHP: Self = Self {
        line_comments: &["//", "#"],
        ..Self::C_LIKE
    };

    /// Python: `#` comments, triple-quoted strings.
    pub const PYTHON: Self = Self {
        line_comments: &["#"],
        block_comment: None,
        nested_block_comments: false,
        quotes: b"\"'",
        triple_quotes: &["\"\"\"", "'''"],
        multiline_quote: None,
        multiline_escapes: true,
        dialect: Dialect::Plain,
    };

    /// Ruby: `#` comments.
    pub const RUBY: Self = Self {
        triple_quotes: &[],
        ..Self::PYTHON
    };

    /// JSON with comments.
    pub const JSONC: Self = Self {
        quotes: b"\"",
        ..Self::C_LIKE
    };
}

/// Operators of Go, longest first so that `:=` wins over `:`.
const GO_OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", ":=", "==", "!=", "<=", ">=", "&&", "||", "<<", ">>", "&^", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "++", "--", "<-", "=", "<", ">", "/", "%", "|", "+",
    "-", "*", "&", "^", "!", ".", ":", ",", ";",
];

/// Words after which a JavaScript `/` starts a regular expression.
const REGEX_KEYWORDS: &[&[u8]] = &[
    b"return", b"typeof", b"instanceof", b"in", b"of", b"new", b"delete", b"void", b"throw",
    b"case", b"do", b"else", b"yield", b"await",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperatorRole {
    /// Separators and postfix operators; they neither need nor start an operand.
    Neutral,
    /// Can start an operand (`-x`, `*p`, `<-ch`), so it may follow another operator.
    Prefix,
    /// Needs an operand on both sides.
    Infix,
}

fn operator_role(op: &str) -> OperatorRole {
    match op {
        "++" | "--" | "..." | "." | ":" | "," | ";" => OperatorRole::Neutral,
        "+" | "-" | "*" | "&" | "^" | "!" | "<-" => OperatorRole::Prefix,
        _ => OperatorRole::Infix,
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Whether a `/` right after `bytes[prev]` starts a regular expression
/// rather than a division.
fn regex_allowed(bytes: &[u8], prev: Option<usize>) -> bool {
    let Some(end) = prev else {
        return true;
    };
    let b = bytes[end];
    if matches!(b, b'+' | b'-') && end > 0 && bytes[end - 1] == b {
        // `x++ / 2`
        return false;
    }
    if b"(,=:[!&|?{};+-*%<>~^".contains(&b) {
        return true;
    }
    if !is_word_byte(b) {
        return false;
    }
    let start = bytes[..=end]
        .iter()
        .rposition(|&c| !is_word_byte(c))
        .map_or(0, |p| p + 1);
    REGEX_KEYWORDS.contains(&&bytes[start..=end])
}

/// Skip a `/.../flags` literal starting at `start`; returns the index past its end.
fn skip_regex(bytes: &[u8], start: usize, line: usize) -> Result<usize, SyntaxIssue> {
    let mut in_class = false;
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'\n' => break,
            b'[' => in_class = true,
            b']' => in_class = false,
            b'/' if !in_class => {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                    i += 1;
                }
                return Ok(i);
            }
            _ => {}
        }
        i += 1;
    }
    Err(SyntaxIssue::new(
        "unclosed regular expression literal",
        Some(line),
    ))
}

/// Balance checker driven by a [`LexicalRules`] table.
#[derive(Debug, Clone, Copy)]
pub struct DelimitedChecker {
    rules: LexicalRules,
}

impl DelimitedChecker {
    /// A checker for the given rules.
    #[must_use]
    pub const fn new(rules: LexicalRules) -> Self {
        Self { rules }
    }
}

/// One pass over a snippet.
struct Scanner<'a> {
    rules: &'a LexicalRules,
    bytes: &'a [u8],
    line: usize,
    /// Open brackets with the line they were opened on.
    open: Vec<(u8, usize)>,
    /// Last byte of code seen, for telling regex literals from division.
    last_code: Option<usize>,
    /// Operator still waiting for its right-hand operand.
    pending: Option<&'static str>,
}

impl<'a> Scanner<'a> {
    fn new(rules: &'a LexicalRules, source: &'a str) -> Self {
        Self {
            rules,
            bytes: source.as_bytes(),
            line: 1,
            open: Vec::new(),
            last_code: None,
            pending: None,
        }
    }

    fn run(mut self) -> Result<(), SyntaxIssue> {
        let mut i = 0usize;
        while i < self.bytes.len() {
            i = self.step(i)?;
        }
        if let Some(&(opener, opened_at)) = self.open.last() {
            return Err(SyntaxIssue::new(
                format!("unclosed `{}`", char::from(opener)),
                Some(opened_at),
            ));
        }
        if let Some(op) = self.pending {
            return Err(SyntaxIssue::new(
                format!("expected an operand after `{op}`"),
                Some(self.line),
            ));
        }
        Ok(())
    }

    /// Consume the token at `i` and return the index after it.
    fn step(&mut self, i: usize) -> Result<usize, SyntaxIssue> {
        let rules = self.rules;
        let bytes = self.bytes;
        let b = bytes[i];
        let rest = &bytes[i..];

        if b == b'\n' {
            self.line += 1;
            return Ok(i + 1);
        }
        if b.is_ascii_whitespace() {
            return Ok(i + 1);
        }
        if rules
            .line_comments
            .iter()
            .any(|c| rest.starts_with(c.as_bytes()))
        {
            return Ok(i + rest.iter().position(|&c| c == b'\n').unwrap_or(rest.len()));
        }
        if let Some(pair) = rules.block_comment
            && rest.starts_with(pair.0.as_bytes())
        {
            return self.skip_block_comment(i, pair);
        }

        let end = if let Some(triple) = rules
            .triple_quotes
            .iter()
            .find(|t| rest.starts_with(t.as_bytes()))
        {
            skip_string(bytes, i, triple.as_bytes(), true, true, &mut self.line)?
        } else if rules.multiline_quote == Some(b) {
            skip_string(bytes, i, &[b], true, rules.multiline_escapes, &mut self.line)?
        } else if rules.quotes.contains(&b) {
            skip_string(bytes, i, &[b], false, true, &mut self.line)?
        } else if rules.dialect == Dialect::JavaScript
            && b == b'/'
            && regex_allowed(bytes, self.last_code)
        {
            skip_regex(bytes, i, self.line)?
        } else if rules.dialect == Dialect::Go
            && let Some(op) = GO_OPERATORS
                .iter()
                .copied()
                .find(|op| rest.starts_with(op.as_bytes()))
        {
            self.operator(op)?;
            self.last_code = Some(i + op.len() - 1);
            return Ok(i + op.len());
        } else {
            self.bracket(b)?;
            i + 1
        };
        self.pending = None;
        self.last_code = Some(end - 1);
        Ok(end)
    }

    fn operator(&mut self, op: &'static str) -> Result<(), SyntaxIssue> {
        let role = operator_role(op);
        if role == OperatorRole::Infix
            && let Some(prev) = self.pending
        {
            return Err(SyntaxIssue::new(
                format!("unexpected `{op}` after `{prev}`"),
                Some(self.line),
            ));
        }
        self.pending = (role != OperatorRole::Neutral).then_some(op);
        Ok(())
    }

    fn bracket(&mut self, b: u8) -> Result<(), SyntaxIssue> {
        match b {
            b'(' | b'[' | b'{' => self.open.push((b, self.line)),
            b')' | b']' | b'}' => {
                if let Some(op) = self.pending {
                    return Err(SyntaxIssue::new(
                        format!("expected an operand after `{op}`, found `{}`", char::from(b)),
                        Some(self.line),
                    ));
                }
                match self.open.pop() {
                    Some((opener, _)) if opener == opener_for(b) => {}
                    Some((opener, opened_at)) => {
                        return Err(SyntaxIssue::new(
                            format!(
                                "mismatched closing `{}`: `{}` opened on line {opened_at} is still open",
                                char::from(b),
                                char::from(opener)
                            ),
                            Some(self.line),
                        ));
                    }
                    None => {
                        return Err(SyntaxIssue::new(
                            format!("unexpected closing `{}`", char::from(b)),
                            Some(self.line),
                        ));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn skip_block_comment(
        &mut self,
        start: usize,
        (open, close): (&str, &str),
    ) -> Result<usize, SyntaxIssue> {
        let bytes = self.bytes;
        let start_line = self.line;
        let mut depth = 1usize;
        let mut i = start + open.len();
        while i < bytes.len() {
            let rest = &bytes[i..];
            if rest.starts_with(close.as_bytes()) {
                depth -= 1;
                i += close.len();
                if depth == 0 {
                    return Ok(i);
                }
                continue;
            }
            if self.rules.nested_block_comments && rest.starts_with(open.as_bytes()) {
                depth += 1;
                i += open.len();
                continue;
            }
            if bytes[i] == b'\n' {
                self.line += 1;
            }
            i += 1;
        }
        Err(SyntaxIssue::new(
            format!("unterminated block comment `{open}`"),
            Some(start_line),
        ))
    }
}

/// Skip a string literal starting at `start`; returns the index past its end.
fn skip_string(
    bytes: &[u8],
    start: usize,
    delim: &[u8],
    multiline: bool,
    escapes: bool,
    line: &mut usize,
) -> Result<usize, SyntaxIssue> {
    let start_line = *line;
    let unclosed = || {
        SyntaxIssue::new(
            format!(
                "unclosed string literal starting with {}",
                String::from_utf8_lossy(delim)
            ),
            Some(start_line),
        )
    };

    let mut i = start + delim.len();
    while i < bytes.len() {
        let b = bytes[i];
        if escapes && b == b'\\' {
            if bytes.get(i + 1) == Some(&b'\n') {
                *line += 1;
            }
            i += 2;
            continue;
        }
        if bytes[i..].starts_with(delim) {
            return Ok(i + delim.len());
        }
        if b == b'\n' {
            if !multiline {
                return Err(unclosed());
            }
            *line += 1;
        }
        i += 1;
    }
    Err(unclosed())
}

fn opener_for(close: u8) -> u8 {
    match close {
        b')' => b'(',
        b']' => b'[',
        _ => b'{',
    }
}

impl SyntaxChecker for DelimitedChecker {
    fn check(&self, source: &str) -> Result<(), SyntaxIssue> {
        Scanner::new(&self.rules, source).run()
    }
}
