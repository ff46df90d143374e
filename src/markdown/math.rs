//! Math span extraction and restoration around markdown parsing.
//!
//! Math is pulled out of the source before comrak sees it, so emphasis and
//! escape rules never touch TeX, then typeset into the finished HTML.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::warn;

use crate::math::{MathMode, MathRenderer, source_fallback};

const TOKEN_PREFIX: &str = "MDHEREMATH";

/// `$$...$$`, newlines allowed. Code spans are matched first and kept.
static DISPLAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?P<code>`[^`]+`)|\$\$(?P<math>.+?)\$\$").expect("display math regex")
});

/// `$...$`, no whitespace inside. Code spans are matched first and kept.
static INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<code>`[^`]+`)|\$(?P<math>\S+?)\$").expect("inline math regex")
});

/// `MDHEREMATH<nonce>N<index>X`
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{TOKEN_PREFIX}(\d+)N(\d+)X")).expect("math token regex")
});

/// A math expression recorded during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathExpression {
    pub source: String,
    pub mode: MathMode,
}

/// Placeholder table for one render call.
///
/// Tokens carry a nonce that does not occur in the input, so text that
/// merely looks like a token is never replaced.
#[derive(Debug, Default)]
pub struct MathPlaceholders {
    nonce: u64,
    expressions: Vec<MathExpression>,
}

impl MathPlaceholders {
    /// Replaces math spans in `text` with placeholder tokens.
    ///
    /// Display math is extracted before inline math so `$$` pairs are never
    /// read as two empty inline spans. Fenced code blocks (also inside block
    /// quotes) and code spans are copied unchanged. Block quote markers are
    /// removed from the continuation lines of quoted display math.
    ///
    /// # Returns
    ///
    /// The rewritten text and the table needed to restore it
    pub fn extract(text: &str) -> (String, Self) {
        let mut table = Self {
            nonce: unused_nonce(text),
            expressions: Vec::new(),
        };
        let mut output = String::with_capacity(text.len());

        for segment in split_fenced_code(text) {
            match segment {
                Segment::Code(code) => output.push_str(code),
                Segment::Prose(prose) => {
                    let prose = table.substitute(&DISPLAY_RE, prose, MathMode::Display);
                    let prose = table.substitute(&INLINE_RE, &prose, MathMode::Inline);
                    output.push_str(&prose);
                }
            }
        }

        (output, table)
    }

    /// Number of recorded expressions.
    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Recorded expression for a token index.
    pub fn get(&self, index: usize) -> Option<&MathExpression> {
        self.expressions.get(index)
    }

    /// Placeholder token for the expression at `index`.
    pub fn token(&self, index: usize) -> String {
        format!("{TOKEN_PREFIX}{}N{index}X", self.nonce)
    }

    /// Replaces placeholder tokens in rendered HTML with typeset math.
    ///
    /// Tokens that do not belong to this table are left untouched. When the
    /// renderer fails, the escaped original source is inserted instead.
    pub fn restore(&self, html: &str, renderer: &dyn MathRenderer) -> String {
        self.replace_tokens(html, |expression| {
            match renderer.render(&expression.source, expression.mode) {
                Ok(rendered) => rendered,
                Err(e) => {
                    warn!("Math rendering failed, keeping source: {:#}", e);
                    source_fallback(&expression.source, expression.mode)
                }
            }
        })
    }

    /// Replaces placeholder tokens with the delimiter-free math source.
    ///
    /// Used where plain text is needed, such as heading slugs.
    pub fn expand_source(&self, text: &str) -> String {
        self.replace_tokens(text, |expression| expression.source.clone())
    }

    /// Replaces placeholder tokens with the source as the user wrote it.
    ///
    /// Used for code the extraction pass could not recognize before parsing,
    /// such as indented code blocks, so code never contains typeset math.
    pub fn expand_delimited(&self, text: &str) -> String {
        self.replace_tokens(text, |expression| {
            let delimiter = expression.mode.delimiter();
            format!("{delimiter}{}{delimiter}", expression.source)
        })
    }

    fn replace_tokens(&self, text: &str, replace: impl Fn(&MathExpression) -> String) -> String {
        if self.is_empty() {
            return text.to_string();
        }

        TOKEN_RE
            .replace_all(text, |caps: &Captures| {
                let expression = caps[1]
                    .parse::<u64>()
                    .ok()
                    .filter(|nonce| *nonce == self.nonce)
                    .and_then(|_| caps[2].parse::<usize>().ok())
                    .and_then(|i| self.get(i));

                match expression {
                    Some(expression) => replace(expression),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    fn substitute(&mut self, re: &Regex, text: &str, mode: MathMode) -> String {
        re.replace_all(text, |caps: &Captures| {
            if let Some(code) = caps.name("code") {
                return code.as_str().to_string();
            }

            let start = caps.get(0).map_or(0, |m| m.start());
            let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
            let opener = &text[line_start..start];
            let source = if strip_quote_prefix(opener).len() != opener.len() {
                strip_quote_markers(&caps["math"])
            } else {
                caps["math"].to_string()
            };

            let token = self.token(self.expressions.len());
            self.expressions.push(MathExpression { source, mode });
            token
        })
        .into_owned()
    }
}

/// Smallest nonce whose token prefix does not occur in `text`.
fn unused_nonce(text: &str) -> u64 {
    (0..)
        .find(|nonce| !text.contains(&format!("{TOKEN_PREFIX}{nonce}N")))
        .unwrap_or_default()
}

/// Removes block quote markers from every line after the first.
fn strip_quote_markers(source: &str) -> String {
    source
        .split_inclusive('\n')
        .enumerate()
        .map(|(i, line)| if i == 0 { line } else { strip_quote_prefix(line) })
        .collect()
}

/// Strips leading block quote markers (`>` with one optional space each).
///
/// Lines without a marker are returned unchanged, indentation included.
fn strip_quote_prefix(line: &str) -> &str {
    let mut rest = line;
    loop {
        let trimmed = rest.trim_start_matches(' ');
        if rest.len() - trimmed.len() > 3 {
            return rest;
        }
        match trimmed.strip_prefix('>') {
            Some(after) => rest = after.strip_prefix([' ', '\t']).unwrap_or(after),
            None => return rest,
        }
    }
}

enum Segment<'a> {
    Prose(&'a str),
    Code(&'a str),
}

/// Splits text into prose and fenced code block segments.
///
/// A fence opens on a line indented at most three spaces (after any block
/// quote markers) that starts with three or more backticks or tildes, and
/// closes on a line with at least as many of the same character and nothing
/// else. An unclosed fence runs to the end of the input.
fn split_fenced_code(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    let mut fence: Option<(char, usize)> = None;

    for line in text.split_inclusive('\n') {
        let line_start = pos;
        pos += line.len();

        match fence {
            None => {
                if let Some(open) = fence_marker(line) {
                    if line_start > start {
                        segments.push(Segment::Prose(&text[start..line_start]));
                    }
                    start = line_start;
                    fence = Some(open);
                }
            }
            Some((ch, len)) => {
                let closes = fence_marker(line).is_some_and(|(c, l)| {
                    c == ch
                        && l >= len
                        && strip_quote_prefix(line).trim().chars().all(|x| x == ch)
                });
                if closes {
                    segments.push(Segment::Code(&text[start..pos]));
                    start = pos;
                    fence = None;
                }
            }
        }
    }

    if start < text.len() {
        let rest = &text[start..];
        segments.push(match fence {
            Some(_) => Segment::Code(rest),
            None => Segment::Prose(rest),
        });
    }

    segments
}

/// Returns fence character and run length when `line` starts a fence.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let line = strip_quote_prefix(line);
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }

    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == ch).count();
    (len >= 3).then_some((ch, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl MathRenderer for Echo {
        fn render(&self, expression: &str, mode: MathMode) -> anyhow::Result<String> {
            Ok(format!("[{:?}:{}]", mode, expression))
        }
    }

    struct Failing;

    impl MathRenderer for Failing {
        fn render(&self, _expression: &str, _mode: MathMode) -> anyhow::Result<String> {
            anyhow::bail!("no typesetter")
        }
    }

    #[test]
    fn test_extract_inline() {
        // Arrange
        let text = "Energy $E=mc^2$ here.";

        // Act
        let (output, table) = MathPlaceholders::extract(text);

        // Assert
        assert_eq!(output, "Energy MDHEREMATH0N0X here.");
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get(0),
            Some(&MathExpression {
                source: "E=mc^2".to_string(),
                mode: MathMode::Inline,
            })
        );
    }

    #[test]
    fn test_extract_display_spans_lines() {
        // Arrange
        let text = "$$\na + b\n$$\n";

        // Act
        let (output, table) = MathPlaceholders::extract(text);

        // Assert
        assert_eq!(output, "MDHEREMATH0N0X\n");
        let expression = table.get(0).expect("Should record display math");
        assert_eq!(expression.source, "\na + b\n");
        assert_eq!(expression.mode, MathMode::Display);
    }

    #[test]
    fn test_extract_display_before_inline() {
        // Arrange
        let text = "$$x$$ and $y$";

        // Act
        let (output, table) = MathPlaceholders::extract(text);

        // Assert
        assert_eq!(output, "MDHEREMATH0N0X and MDHEREMATH0N1X");
        assert_eq!(table.get(0).map(|e| e.mode), Some(MathMode::Display));
        assert_eq!(table.get(1).map(|e| e.mode), Some(MathMode::Inline));
    }

    #[test]
    fn test_inline_rejects_whitespace() {
        // Arrange
        let text = "It costs $5 and $10 today.";

        // Act
        let (output, table) = MathPlaceholders::extract(text);

        // Assert
        assert_eq!(output, text, "Currency amounts should not become math");
        assert!(table.is_empty());
    }

    #[test]
    fn test_code_span_untouched() {
        // Arrange
        let text = "Use `$HOME$` and $x$.";

        // Act
        let (output, table) = MathPlaceholders::extract(text);

        // Assert
        assert_eq!(output, "Use `$HOME$` and MDHEREMATH0N0X.");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_fenced_code_untouched() {
        // Arrange
        let text = "$a$\n\n```sh\necho $x$\n```\n\n$b$\n";

        // Act
        let (output, table) = MathPlaceholders::extract(text);

        // Assert
        assert_eq!(
            output,
            "MDHEREMATH0N0X\n\n```sh\necho $x$\n```\n\nMDHEREMATH0N1X\n"
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        // Arrange
        let text = "~~~\n$x$\n";

        // Act
        let (output, table) = MathPlaceholders::extract(text);

        // Assert
        assert_eq!(output, text);
        assert!(table.is_empty());
    }

    #[test]
    fn test_restore_replaces_tokens() {
        // Arrange
        let (output, table) = MathPlaceholders::extract("$$a$$ then $b$");
        let html = format!("<p>{}</p>", output);

        // Act
        let restored = table.restore(&html, &Echo);

        // Assert
        assert_eq!(restored, "<p>[Display:a] then [Inline:b]</p>");
    }

    #[test]
    fn test_restore_leaves_unknown_tokens() {
        // Arrange
        let (_, table) = MathPlaceholders::extract("$a$");

        // Act
        let restored = table.restore("MDHEREMATH0N0X MDHEREMATH0N7X", &Echo);

        // Assert
        assert_eq!(restored, "[Inline:a] MDHEREMATH0N7X");
    }

    #[test]
    fn test_restore_falls_back_to_source() {
        // Arrange
        let (output, table) = MathPlaceholders::extract("$a<b$");

        // Act
        let restored = table.restore(&output, &Failing);

        // Assert
        assert_eq!(restored, "$a&lt;b$");
    }

    #[test]
    fn test_expand_source() {
        // Arrange
        let (output, table) = MathPlaceholders::extract("Euler $e^x$");

        // Act
        let text = table.expand_source(&output);

        // Assert
        assert_eq!(text, "Euler e^x");
    }

    #[test]
    fn test_expand_delimited() {
        // Arrange
        let (output, table) = MathPlaceholders::extract("echo $HOME$ $$x$$");

        // Act
        let text = table.expand_delimited(&output);

        // Assert
        assert_eq!(text, "echo $HOME$ $$x$$");
    }

    #[test]
    fn test_token_lookalike_in_input_untouched() {
        // Arrange
        let text = "literal MDHEREMATH0N0X and $y$";

        // Act
        let (output, table) = MathPlaceholders::extract(text);
        let restored = table.restore(&output, &Echo);

        // Assert
        assert_eq!(table.token(0), "MDHEREMATH1N0X");
        assert_eq!(restored, "literal MDHEREMATH0N0X and [Inline:y]");
    }

    #[test]
    fn test_quoted_display_math_drops_markers() {
        // Arrange
        let text = "> $$\n> a+b\n>  > c\n> $$\n";

        // Act
        let (output, table) = MathPlaceholders::extract(text);

        // Assert
        assert_eq!(output, "> MDHEREMATH0N0X\n");
        let expression = table.get(0).expect("Should record display math");
        assert_eq!(expression.source, "\na+b\nc\n");
        assert_eq!(expression.mode, MathMode::Display);
    }

    #[test]
    fn test_unquoted_display_math_keeps_relations() {
        // Arrange
        let text = "$$\na\n> b\n$$";

        // Act
        let (_, table) = MathPlaceholders::extract(text);

        // Assert
        assert_eq!(table.get(0).map(|e| e.source.as_str()), Some("\na\n> b\n"));
    }

    #[test]
    fn test_quoted_fence_untouched() {
        // Arrange
        let text = "> ~~~\n> echo $x$\n> ~~~\n\n$y$\n";

        // Act
        let (output, table) = MathPlaceholders::extract(text);

        // Assert
        assert_eq!(output, "> ~~~\n> echo $x$\n> ~~~\n\nMDHEREMATH0N0X\n");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_strip_quote_prefix() {
        // Arrange & Act & Assert
        assert_eq!(strip_quote_prefix("> a"), "a");
        assert_eq!(strip_quote_prefix(">> a"), "a");
        assert_eq!(strip_quote_prefix("  > > ~~~"), "~~~");
        assert_eq!(strip_quote_prefix("    > code"), "    > code");
        assert_eq!(strip_quote_prefix("plain"), "plain");
    }

    #[test]
    fn test_fence_marker() {
        // Arrange & Act & Assert
        assert_eq!(fence_marker("> ```\n"), Some(('`', 3)));
        assert_eq!(fence_marker("```rust\n"), Some(('`', 3)));
        assert_eq!(fence_marker("   ~~~~\n"), Some(('~', 4)));
        assert_eq!(fence_marker("    ```\n"), None);
        assert_eq!(fence_marker("``\n"), None);
        assert_eq!(fence_marker("text\n"), None);
    }
}
